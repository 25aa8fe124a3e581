//! Visual theme and styling.

use console::Style;

/// Gitstep's visual theme.
#[derive(Debug, Clone)]
pub struct GitstepTheme {
    /// Style for success messages (green).
    pub success: Style,
    /// Style for warning messages (orange).
    pub warning: Style,
    /// Style for error messages (red bold).
    pub error: Style,
    /// Style for prompt titles (bold cyan).
    pub title: Style,
    /// Style for descriptions and details (dim).
    pub dim: Style,
    /// Style for the highlighted default choice (bold).
    pub highlight: Style,
    /// Style for directive rows such as Back and Cancel (dim italic).
    pub directive: Style,
    /// Style for separators (dim).
    pub separator: Style,
    /// Style for nav buttons (magenta).
    pub button: Style,
}

impl Default for GitstepTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl GitstepTheme {
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            title: Style::new().cyan().bold(),
            dim: Style::new().dim(),
            highlight: Style::new().bold(),
            directive: Style::new().dim().italic(),
            separator: Style::new().dim(),
            button: Style::new().magenta(),
        }
    }

    /// Create a theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            title: Style::new(),
            dim: Style::new(),
            highlight: Style::new(),
            directive: Style::new(),
            separator: Style::new(),
            button: Style::new(),
        }
    }

    /// Format a success message (icon + text in green).
    pub fn format_success(&self, msg: &str) -> String {
        format!("{}", self.success.apply_to(format!("✓ {}", msg)))
    }

    /// Format a warning message (icon + text in orange).
    pub fn format_warning(&self, msg: &str) -> String {
        format!("{}", self.warning.apply_to(format!("⚠ {}", msg)))
    }

    /// Format an error message (icon + text in red bold).
    pub fn format_error(&self, msg: &str) -> String {
        format!("{}", self.error.apply_to(format!("✗ {}", msg)))
    }

    /// Format a prompt title with its placeholder.
    pub fn format_title(&self, title: &str, placeholder: Option<&str>) -> String {
        match placeholder {
            Some(placeholder) if !placeholder.is_empty() => format!(
                "{} {}",
                self.title.apply_to(title),
                self.dim.apply_to(format!("· {}", placeholder))
            ),
            _ => self.title.apply_to(title).to_string(),
        }
    }

    /// Format a list row with its description.
    pub fn format_row(&self, label: &str, description: Option<&str>) -> String {
        match description {
            Some(description) => format!("{}  {}", label, self.dim.apply_to(description)),
            None => label.to_string(),
        }
    }

    pub fn format_separator(&self, label: &str) -> String {
        self.separator
            .apply_to(format!("── {} ──", label))
            .to_string()
    }

    pub fn format_directive(&self, label: &str) -> String {
        self.directive.apply_to(label).to_string()
    }

    pub fn format_button(&self, glyph: &str, tooltip: &str) -> String {
        self.button.apply_to(format!("{} {}", glyph, tooltip)).to_string()
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors() -> bool {
    // Check NO_COLOR env var (https://no-color.org/)
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    // Check if stdout is a TTY
    console::Term::stdout().is_term()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_formats_success() {
        let theme = GitstepTheme::plain();
        let msg = theme.format_success("Pushed");
        assert!(msg.contains("✓"));
        assert!(msg.contains("Pushed"));
    }

    #[test]
    fn theme_formats_error() {
        let theme = GitstepTheme::plain();
        let msg = theme.format_error("Failed");
        assert!(msg.contains("✗"));
        assert!(msg.contains("Failed"));
    }

    #[test]
    fn title_includes_placeholder() {
        let theme = GitstepTheme::plain();
        assert_eq!(
            theme.format_title("Push", Some("Choose repositories")),
            "Push · Choose repositories"
        );
        assert_eq!(theme.format_title("Push", None), "Push");
    }

    #[test]
    fn row_includes_description() {
        let theme = GitstepTheme::plain();
        assert_eq!(theme.format_row("main", Some("current")), "main  current");
    }

    #[test]
    fn button_includes_glyph() {
        let theme = GitstepTheme::plain();
        assert_eq!(theme.format_button("⟳", "Fetch"), "⟳ Fetch");
    }
}
