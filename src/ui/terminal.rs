use std::io::{self, BufRead, IsTerminal, Read, Write};

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use unicode_width::UnicodeWidthStr;

use super::{
    DetailView, FieldKind, Form, FormField, FormValues, ListView, Navigation, Notice, NoticeStyle,
    Presenter,
};
use crate::diff::{classify_line, LineType};
use crate::editor::{self, ComposeRequest};
use crate::format::StateMarker;

#[derive(Debug, Clone, Default)]
pub struct TerminalOptions {
    /// Emit lists and details as JSON instead of styled text.
    pub json: bool,
    pub color: bool,
    /// Prompt on the terminal and open the editor for missing form values.
    pub interactive: bool,
    pub editor: Option<String>,
}

#[derive(Clone, Copy)]
enum Tone {
    Title,
    Heading,
    Dim,
    Added,
    Removed,
    Hunk,
    Meta,
    Success,
    Failure,
    Marker(StateMarker),
}

/// Plain stdout/stderr front end.
pub struct TerminalPresenter {
    out: Box<dyn Write>,
    err: Box<dyn Write>,
    input: Option<Box<dyn BufRead>>,
    options: TerminalOptions,
}

impl TerminalPresenter {
    /// Presenter over the process's standard streams. Colour and prompting
    /// are only enabled when the relevant stream is a terminal.
    pub fn stdio(mut options: TerminalOptions) -> Self {
        options.color = options.color && io::stdout().is_terminal();
        options.interactive = options.interactive && io::stdin().is_terminal();
        let input: Box<dyn BufRead> = Box::new(io::BufReader::new(io::stdin()));
        Self::with_io(
            Box::new(io::stdout()),
            Box::new(io::stderr()),
            Some(input),
            options,
        )
    }

    pub fn with_io(
        out: Box<dyn Write>,
        err: Box<dyn Write>,
        input: Option<Box<dyn BufRead>>,
        options: TerminalOptions,
    ) -> Self {
        Self {
            out,
            err,
            input,
            options,
        }
    }

    fn paint(&self, text: &str, tone: Tone) -> String {
        if !self.options.color {
            return text.to_string();
        }
        let styled = match tone {
            Tone::Title => text.bold().underlined(),
            Tone::Heading => text.bold(),
            Tone::Dim => text.dark_grey(),
            Tone::Added => text.green(),
            Tone::Removed => text.red(),
            Tone::Hunk => text.cyan(),
            Tone::Meta => text.bold().dark_grey(),
            Tone::Success => text.green(),
            Tone::Failure => text.red().bold(),
            Tone::Marker(marker) => match marker {
                StateMarker::Running => text.blue(),
                StateMarker::Completed => text.green(),
                StateMarker::Failed => text.red(),
                StateMarker::Pending => text.dark_grey(),
                StateMarker::NeedsAttention => text.yellow().bold(),
                StateMarker::Unknown => text.white(),
            },
        };
        styled.to_string()
    }

    /// Style markdown line by line; diff fences get per-line colours.
    fn render_markdown(&self, markdown: &str) -> String {
        let mut out = String::new();
        let mut open_fence: Option<(usize, bool)> = None;

        for line in markdown.lines() {
            let ticks = line.chars().take_while(|c| *c == '`').count();
            let painted = match open_fence {
                Some((open_ticks, _)) if ticks >= open_ticks && line[ticks..].trim().is_empty() => {
                    open_fence = None;
                    self.paint(line, Tone::Dim)
                }
                Some((_, true)) => {
                    let tone = match classify_line(line).0 {
                        LineType::Added => Tone::Added,
                        LineType::Removed => Tone::Removed,
                        LineType::Header => Tone::Hunk,
                        LineType::Meta => Tone::Meta,
                        LineType::Context => {
                            out.push_str(line);
                            out.push('\n');
                            continue;
                        }
                    };
                    self.paint(line, tone)
                }
                Some((_, false)) => line.to_string(),
                None if ticks >= 3 => {
                    let lang = line[ticks..].trim();
                    open_fence = Some((ticks, lang == "diff"));
                    self.paint(line, Tone::Dim)
                }
                None if line.starts_with('#') => self.paint(line, Tone::Heading),
                None => line.to_string(),
            };
            out.push_str(&painted);
            out.push('\n');
        }
        out
    }

    fn write_json<T: serde::Serialize>(&mut self, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
        writeln!(self.out, "{}", json)?;
        Ok(())
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        let Some(input) = self.input.as_mut() else {
            return Ok(None);
        };
        write!(self.err, "{}", prompt)?;
        self.err.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim_end_matches(['\r', '\n']).to_string();
        Ok(Some(line))
    }

    fn read_all(&mut self) -> Result<Option<String>> {
        let Some(input) = self.input.as_mut() else {
            return Ok(None);
        };
        let mut text = String::new();
        input.read_to_string(&mut text)?;
        let text = text.trim().to_string();
        Ok((!text.is_empty()).then_some(text))
    }

    /// `Ok(None)` cancels the whole form.
    fn ask(&mut self, form: &Form, field: &FormField) -> Result<Option<Option<String>>> {
        if let Some(value) = &field.value {
            return Ok(Some(Some(value.clone())));
        }
        let hint = field
            .placeholder
            .as_deref()
            .map(|p| format!(" ({})", p))
            .unwrap_or_default();

        let value = match &field.kind {
            FieldKind::Checkbox => Some("false".to_string()),
            FieldKind::Dropdown(options) if !self.options.interactive => options.first().cloned(),
            FieldKind::Dropdown(options) => {
                for (i, option) in options.iter().enumerate() {
                    writeln!(self.err, "  {}. {}", i + 1, option)?;
                }
                let answer = self.read_line(&format!("{}{} [1]: ", field.label, hint))?;
                let index = answer
                    .as_deref()
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(|a| a.parse::<usize>().ok().filter(|n| (1..=options.len()).contains(n)))
                    .unwrap_or(Some(1));
                match index {
                    Some(n) => options.get(n - 1).cloned(),
                    None => anyhow::bail!("{}: choose a number between 1 and {}", field.label, options.len()),
                }
            }
            FieldKind::TextArea if self.options.interactive => {
                let instructions = if field.instructions.is_empty() {
                    let mut lines = vec![form.title.clone(), field.label.clone()];
                    lines.extend(field.placeholder.clone());
                    lines
                } else {
                    field.instructions.clone()
                };
                let composed = editor::compose(
                    self.options.editor.as_deref(),
                    ComposeRequest {
                        instructions,
                        initial: None,
                    },
                )?;
                if composed.is_none() && field.required {
                    return Ok(None);
                }
                composed
            }
            FieldKind::TextArea => self.read_all()?,
            FieldKind::Text if self.options.interactive => {
                self.read_line(&format!("{}{}: ", field.label, hint))?
            }
            FieldKind::Text => None,
        };
        Ok(Some(value))
    }
}

impl Presenter for TerminalPresenter {
    fn render_list(&mut self, view: &ListView) -> Result<()> {
        if self.options.json {
            return self.write_json(view);
        }

        let mut text = String::new();
        if !view.title.is_empty() {
            text.push_str(&self.paint(&view.title, Tone::Title));
            text.push('\n');
        }
        if view.is_empty() {
            text.push('\n');
            text.push_str(&self.paint(&view.empty_message, Tone::Dim));
            text.push('\n');
        }

        for section in view.sections.iter().filter(|s| !s.items.is_empty()) {
            text.push('\n');
            if !section.title.is_empty() {
                let heading = format!("{} ({})", section.title, section.items.len());
                text.push_str(&self.paint(&heading, Tone::Heading));
                text.push('\n');
            }
            let width = section
                .items
                .iter()
                .map(|i| UnicodeWidthStr::width(i.title.as_str()))
                .max()
                .unwrap_or(0);
            for item in &section.items {
                let glyph = match item.marker {
                    Some(marker) => self.paint(marker.glyph(), Tone::Marker(marker)),
                    None => "-".to_string(),
                };
                let pad = width - UnicodeWidthStr::width(item.title.as_str());
                let mut line = format!("  {} {}{}", glyph, item.title, " ".repeat(pad));
                if let Some(subtitle) = &item.subtitle {
                    line.push_str("  ");
                    line.push_str(&self.paint(subtitle, Tone::Dim));
                }
                if !item.accessories.is_empty() {
                    line.push_str("  ");
                    line.push_str(&self.paint(&item.accessories.join(" · "), Tone::Dim));
                }
                text.push_str(line.trim_end());
                text.push('\n');
            }
        }

        if let Some(footer) = &view.footer {
            text.push('\n');
            text.push_str(&self.paint(footer, Tone::Dim));
            text.push('\n');
        }
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    fn render_detail(&mut self, view: &DetailView) -> Result<()> {
        if self.options.json {
            return self.write_json(view);
        }

        let mut text = String::new();
        if !view.title.is_empty() {
            text.push_str(&self.paint(&view.title, Tone::Title));
            text.push_str("\n\n");
        }
        text.push_str(&self.render_markdown(&view.markdown));

        if !view.metadata.is_empty() {
            let width = view
                .metadata
                .iter()
                .map(|m| UnicodeWidthStr::width(m.label.as_str()))
                .max()
                .unwrap_or(0);
            text.push('\n');
            for entry in &view.metadata {
                let pad = width - UnicodeWidthStr::width(entry.label.as_str());
                let label = format!("{}{}", entry.label, " ".repeat(pad));
                text.push_str(&format!("{}  {}\n", self.paint(&label, Tone::Dim), entry.value));
            }
        }

        if !view.actions.is_empty() {
            text.push('\n');
            for action in &view.actions {
                text.push_str(&format!(
                    "{} {}\n",
                    self.paint(&format!("{}:", action.title), Tone::Dim),
                    action.value
                ));
            }
        }
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    fn render_text(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes())?;
        if !text.ends_with('\n') {
            self.out.write_all(b"\n")?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn render_form(&mut self, form: &Form) -> Result<Option<FormValues>> {
        let mut values = FormValues::default();
        for field in &form.fields {
            match self.ask(form, field)? {
                None => return Ok(None),
                Some(Some(value)) => values.insert(field.id, value),
                Some(None) => {}
            }
        }
        form.validate(&values)
            .map_err(|e| anyhow::anyhow!("{}: {}", form.title, e))?;
        Ok(Some(values))
    }

    fn notify(&mut self, notice: &Notice) {
        let (glyph, tone) = match notice.style {
            NoticeStyle::Animated => ("…", Tone::Dim),
            NoticeStyle::Success => ("✔", Tone::Success),
            NoticeStyle::Failure => ("✘", Tone::Failure),
        };
        let head = self.paint(&format!("{} {}", glyph, notice.title), tone);
        let line = match &notice.message {
            Some(message) => format!("{}: {}", head, message),
            None => head,
        };
        // Notices are best-effort; a closed stderr must not fail the command.
        let _ = writeln!(self.err, "{}", line);
    }

    fn navigate(&mut self, navigation: Navigation) {
        match navigation {
            Navigation::Push(title) => tracing::debug!(%title, "navigate"),
            Navigation::Pop => {}
            Navigation::OpenUrl(url) => {
                let _ = writeln!(self.err, "Open in browser: {}", url);
            }
        }
    }
}
