/// A canned prompt offered on the welcome screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarterPrompt {
    pub title: &'static str,
    pub prompt: &'static str,
}

pub const STARTER_PROMPTS: [StarterPrompt; 4] = [
    StarterPrompt {
        title: "Portfolio",
        prompt: "A portfolio website for a graphic designer, featuring a masonry grid layout for projects.",
    },
    StarterPrompt {
        title: "Landing Page",
        prompt: "A landing page for a new meditation app with a calming blue and green color scheme.",
    },
    StarterPrompt {
        title: "Interactive Quiz",
        prompt: "An interactive quiz about space exploration with multiple-choice questions.",
    },
    StarterPrompt {
        title: "To-Do App",
        prompt: "A simple to-do list application with functionality to add, delete, and mark tasks as complete.",
    },
];
