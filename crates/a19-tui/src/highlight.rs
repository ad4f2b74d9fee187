//! Syntax highlighting for the HTML, CSS and JavaScript tabs.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Style as SyntectStyle, ThemeSet};
use syntect::parsing::SyntaxSet;

const THEME: &str = "base16-ocean.dark";

pub struct CodeHighlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    // Last rendered (language, source) and its lines
    cache: Option<(String, String, Vec<Line<'static>>)>,
}

impl CodeHighlighter {
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            cache: None,
        }
    }

    /// Highlighted source with a line number gutter. `lang` is a file
    /// extension such as "html", "css" or "js".
    pub fn lines(&mut self, source: &str, lang: &str) -> &[Line<'static>] {
        let hit = matches!(&self.cache, Some((l, s, _)) if l == lang && s == source);
        if !hit {
            let lines = self.highlight(source, lang);
            self.cache = Some((lang.to_string(), source.to_string(), lines));
        }
        self.cache
            .as_ref()
            .map(|(_, _, lines)| lines.as_slice())
            .unwrap_or(&[])
    }

    fn highlight(&self, source: &str, lang: &str) -> Vec<Line<'static>> {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());
        let theme = self.theme_set.themes.get(THEME);
        let mut highlighter = theme.map(|theme| HighlightLines::new(syntax, theme));

        let total = source.lines().count();
        let width = total.to_string().len();
        let gutter = Style::default().fg(Color::DarkGray);

        source
            .lines()
            .enumerate()
            .map(|(i, line)| {
                let line = line.replace('\t', "    ");
                let mut spans = vec![Span::styled(
                    format!("{:>width$} ", i + 1, width = width),
                    gutter,
                )];

                // The newline-aware grammars need the terminator to close line comments
                let with_newline = format!("{}\n", line);
                let ranges: Vec<(SyntectStyle, &str)> = highlighter
                    .as_mut()
                    .and_then(|h| h.highlight_line(&with_newline, &self.syntax_set).ok())
                    .unwrap_or_default();

                if ranges.is_empty() {
                    spans.push(Span::raw(line));
                } else {
                    spans.extend(ranges.into_iter().filter_map(|(style, text)| {
                        let text = text.trim_end_matches('\n');
                        (!text.is_empty()).then(|| Span::styled(text.to_string(), to_ratatui(style)))
                    }));
                }
                Line::from(spans)
            })
            .collect()
    }
}

fn to_ratatui(style: SyntectStyle) -> Style {
    let fg = style.foreground;
    let mut out = Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b));
    if style.font_style.contains(FontStyle::BOLD) {
        out = out.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        out = out.add_modifier(Modifier::ITALIC);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        out = out.add_modifier(Modifier::UNDERLINED);
    }
    out
}
