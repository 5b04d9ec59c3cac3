//! Keybinding registry: maps actions to key events with config overrides.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    NavDown,
    NavUp,
    NavFirst,
    NavLast,
    AddPost,
    EditPost,
    DeletePost,
    Refresh,
    OpenInBrowser,
    ShowHelp,
    Back,
    NextField,
    PrevField,
    PickNext,
    PickPrev,
    Submit,
    Confirm,
    Deny,
}

impl Action {
    /// Human-readable description for the help screen.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit application",
            Self::NavDown => "Navigate down",
            Self::NavUp => "Navigate up",
            Self::NavFirst => "Jump to first post",
            Self::NavLast => "Jump to last post",
            Self::AddPost => "Add a new post",
            Self::EditPost => "Edit selected post",
            Self::DeletePost => "Delete selected post",
            Self::Refresh => "Reload posts and images",
            Self::OpenInBrowser => "Open post in browser",
            Self::ShowHelp => "Show help",
            Self::Back => "Close / dismiss",
            Self::NextField => "Next field",
            Self::PrevField => "Previous field",
            Self::PickNext => "Next category / status",
            Self::PickPrev => "Previous category / status",
            Self::Submit => "Save post",
            Self::Confirm => "Confirm",
            Self::Deny => "Cancel",
        }
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context: determines which bindings are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    /// The post table.
    Global,
    /// Add/edit form. Unbound keys are typed into the focused field.
    Form,
    /// Delete confirmation dialog.
    Confirm,
    Help,
}

impl Context {
    /// Whether unbound keys fall through to the Global bindings.
    fn inherits_global(self) -> bool {
        matches!(self, Self::Help)
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Global => "Posts",
            Self::Form => "Post form",
            Self::Confirm => "Confirmation",
            Self::Help => "Help",
        }
    }
}

// ============================================================================
// Key Specification
// ============================================================================

/// A key event: code + modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn ch(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }
}

/// Parse a key string from config into a KeySpec.
///
/// Supported formats:
/// - Single char: "q", "j", "/"
/// - Named keys: "Enter", "Esc", "Tab", "Shift+Tab", "Up", "Down", "Delete"
/// - Modifier combos: "Ctrl+s"
/// - Function keys: "F1" through "F12"
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+") {
        let mut chars = rest.trim().chars();
        let c = chars.next()?;
        return match chars.next() {
            None => Some(KeySpec::ctrl(c.to_ascii_lowercase())),
            Some(_) => None,
        };
    }

    match s.to_lowercase().as_str() {
        "enter" | "return" => return Some(KeySpec::plain(KeyCode::Enter)),
        "esc" | "escape" => return Some(KeySpec::plain(KeyCode::Esc)),
        "tab" => return Some(KeySpec::plain(KeyCode::Tab)),
        "shift+tab" | "backtab" => return Some(KeySpec::new(KeyCode::BackTab, KeyModifiers::SHIFT)),
        "up" => return Some(KeySpec::plain(KeyCode::Up)),
        "down" => return Some(KeySpec::plain(KeyCode::Down)),
        "left" => return Some(KeySpec::plain(KeyCode::Left)),
        "right" => return Some(KeySpec::plain(KeyCode::Right)),
        "home" => return Some(KeySpec::plain(KeyCode::Home)),
        "end" => return Some(KeySpec::plain(KeyCode::End)),
        "delete" | "del" => return Some(KeySpec::plain(KeyCode::Delete)),
        "backspace" => return Some(KeySpec::plain(KeyCode::Backspace)),
        "space" => return Some(KeySpec::ch(' ')),
        _ => {}
    }

    if let Some(n) = s.strip_prefix(['F', 'f']).and_then(|n| n.parse::<u8>().ok()) {
        if (1..=12).contains(&n) {
            return Some(KeySpec::plain(KeyCode::F(n)));
        }
    }

    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(KeySpec::ch(c)),
        _ => None,
    }
}

/// Format a KeySpec as a human-readable string for the help screen.
fn format_key(key: &KeySpec) -> String {
    let modifier = if key.modifiers.contains(KeyModifiers::CONTROL) {
        "Ctrl+"
    } else {
        ""
    };

    let key_name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "Shift+Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::Delete => "Delete".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => "?".to_string(),
    };

    format!("{}{}", modifier, key_name)
}

// ============================================================================
// Keybinding Registry
// ============================================================================

/// Registry of keybindings, supporting default bindings and config overrides.
///
/// The same key can map to different actions in different contexts.
pub struct KeybindingRegistry {
    /// Primary lookup: (Context, KeySpec) -> Action
    lookup: HashMap<(Context, KeySpec), Action>,
    /// All bindings for help screen enumeration
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::new(),
            bindings: Vec::new(),
        };
        registry.register_defaults();
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    fn register_defaults(&mut self) {
        use Context::{Confirm, Form, Global, Help};

        // === Post table ===
        self.bind(Global, KeySpec::ch('q'), Action::Quit);
        self.bind(Global, KeySpec::ch('j'), Action::NavDown);
        self.bind(Global, KeySpec::plain(KeyCode::Down), Action::NavDown);
        self.bind(Global, KeySpec::ch('k'), Action::NavUp);
        self.bind(Global, KeySpec::plain(KeyCode::Up), Action::NavUp);
        self.bind(Global, KeySpec::ch('g'), Action::NavFirst);
        self.bind(Global, KeySpec::plain(KeyCode::Home), Action::NavFirst);
        self.bind(Global, KeySpec::ch('G'), Action::NavLast);
        self.bind(Global, KeySpec::plain(KeyCode::End), Action::NavLast);

        self.bind(Global, KeySpec::ch('a'), Action::AddPost);
        self.bind(Global, KeySpec::ch('e'), Action::EditPost);
        self.bind(Global, KeySpec::plain(KeyCode::Enter), Action::EditPost);
        self.bind(Global, KeySpec::ch('d'), Action::DeletePost);
        self.bind(Global, KeySpec::plain(KeyCode::Delete), Action::DeletePost);
        self.bind(Global, KeySpec::ch('r'), Action::Refresh);
        self.bind(Global, KeySpec::ch('o'), Action::OpenInBrowser);
        self.bind(Global, KeySpec::ch('?'), Action::ShowHelp);
        self.bind(Global, KeySpec::plain(KeyCode::Esc), Action::Back);

        // === Form ===
        // Only non-printing keys here; everything else is text input.
        self.bind(Form, KeySpec::plain(KeyCode::Tab), Action::NextField);
        self.bind(Form, KeySpec::plain(KeyCode::Down), Action::NextField);
        self.bind(
            Form,
            KeySpec::new(KeyCode::BackTab, KeyModifiers::SHIFT),
            Action::PrevField,
        );
        self.bind(Form, KeySpec::plain(KeyCode::Up), Action::PrevField);
        self.bind(Form, KeySpec::plain(KeyCode::Right), Action::PickNext);
        self.bind(Form, KeySpec::plain(KeyCode::Left), Action::PickPrev);
        self.bind(Form, KeySpec::ctrl('s'), Action::Submit);
        self.bind(Form, KeySpec::plain(KeyCode::Esc), Action::Back);

        // === Delete confirmation ===
        self.bind(Confirm, KeySpec::ch('y'), Action::Confirm);
        self.bind(Confirm, KeySpec::plain(KeyCode::Enter), Action::Confirm);
        self.bind(Confirm, KeySpec::ch('n'), Action::Deny);
        self.bind(Confirm, KeySpec::plain(KeyCode::Esc), Action::Deny);

        // === Help overlay ===
        self.bind(Help, KeySpec::ch('?'), Action::Back);
        self.bind(Help, KeySpec::plain(KeyCode::Esc), Action::Back);
    }

    /// Apply user overrides from config keybindings map.
    ///
    /// Keys in the map are action names (e.g., "quit", "add_post").
    /// Values are key strings (e.g., "q", "Ctrl+s", "F5").
    ///
    /// Returns a list of warnings for unrecognized action names or unparseable keys.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        // Sorted so repeated runs apply (and warn) in the same order
        let mut entries: Vec<_> = overrides.iter().collect();
        entries.sort();

        for (action_name, key_str) in entries {
            let Some(action) = parse_action_name(action_name) else {
                warnings.push(format!("Unknown action '{}', ignoring", action_name));
                continue;
            };

            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{}' for action '{}', ignoring",
                    key_str, action_name
                ));
                continue;
            };

            let mut contexts: Vec<Context> = self
                .bindings
                .iter()
                .filter(|(_, _, a)| *a == action)
                .map(|(c, _, _)| *c)
                .collect();
            contexts.dedup();

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);

            for ctx in contexts {
                self.bind(ctx, key, action);
            }

            tracing::info!(
                action = %action_name,
                key = %key_str,
                "Applied keybinding override"
            );
        }

        warnings
    }

    /// Look up the action for a key in a context.
    ///
    /// Contexts that inherit the table bindings fall back to Global.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        // Terminals report BackTab with or without SHIFT
        let modifiers = if code == KeyCode::BackTab {
            KeyModifiers::SHIFT
        } else {
            modifiers
        };
        let key = KeySpec::new(code, modifiers);

        if let Some(&action) = self.lookup.get(&(context, key)) {
            return Some(action);
        }

        if context.inherits_global() {
            return self.lookup.get(&(Context::Global, key)).copied();
        }

        None
    }

    /// Bindings for the help screen: (context, key display, description).
    pub fn all_bindings(&self) -> Vec<(Context, String, &'static str)> {
        self.bindings
            .iter()
            .map(|(ctx, key, action)| (*ctx, format_key(key), action.describe()))
            .collect()
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an action name string (from config) into an Action enum.
fn parse_action_name(name: &str) -> Option<Action> {
    match name.to_lowercase().as_str() {
        "quit" => Some(Action::Quit),
        "nav_down" | "down" => Some(Action::NavDown),
        "nav_up" | "up" => Some(Action::NavUp),
        "nav_first" | "first" => Some(Action::NavFirst),
        "nav_last" | "last" => Some(Action::NavLast),
        "add_post" | "add" | "new" => Some(Action::AddPost),
        "edit_post" | "edit" => Some(Action::EditPost),
        "delete_post" | "delete" => Some(Action::DeletePost),
        "refresh" => Some(Action::Refresh),
        "open_in_browser" | "open" => Some(Action::OpenInBrowser),
        "show_help" | "help" => Some(Action::ShowHelp),
        "back" => Some(Action::Back),
        "next_field" => Some(Action::NextField),
        "prev_field" => Some(Action::PrevField),
        "pick_next" => Some(Action::PickNext),
        "pick_prev" => Some(Action::PickPrev),
        "submit" | "save" => Some(Action::Submit),
        "confirm" => Some(Action::Confirm),
        "deny" | "cancel" => Some(Action::Deny),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_keys() {
        let reg = KeybindingRegistry::new();
        let cases = [
            (KeyCode::Char('q'), Action::Quit),
            (KeyCode::Char('j'), Action::NavDown),
            (KeyCode::Down, Action::NavDown),
            (KeyCode::Char('k'), Action::NavUp),
            (KeyCode::Char('a'), Action::AddPost),
            (KeyCode::Char('e'), Action::EditPost),
            (KeyCode::Enter, Action::EditPost),
            (KeyCode::Char('d'), Action::DeletePost),
            (KeyCode::Char('r'), Action::Refresh),
            (KeyCode::Char('o'), Action::OpenInBrowser),
            (KeyCode::Char('?'), Action::ShowHelp),
        ];
        for (code, expected) in cases {
            assert_eq!(
                reg.action_for_key(code, KeyModifiers::NONE, Context::Global),
                Some(expected),
                "{:?}",
                code
            );
        }
    }

    #[test]
    fn test_form_does_not_inherit_table_keys() {
        let reg = KeybindingRegistry::new();
        // 'q' must be typed into the form, not quit
        assert_eq!(
            reg.action_for_key(KeyCode::Char('q'), KeyModifiers::NONE, Context::Form),
            None
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('s'), KeyModifiers::CONTROL, Context::Form),
            Some(Action::Submit)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Enter, KeyModifiers::NONE, Context::Form),
            None
        );
    }

    #[test]
    fn test_backtab_modifier_normalized() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::BackTab, KeyModifiers::NONE, Context::Form),
            Some(Action::PrevField)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::BackTab, KeyModifiers::SHIFT, Context::Form),
            Some(Action::PrevField)
        );
    }

    #[test]
    fn test_help_falls_back_to_global() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('q'), KeyModifiers::NONE, Context::Help),
            Some(Action::Quit)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('?'), KeyModifiers::NONE, Context::Help),
            Some(Action::Back)
        );
    }

    #[test]
    fn test_confirm_context() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            reg.action_for_key(KeyCode::Char('y'), KeyModifiers::NONE, Context::Confirm),
            Some(Action::Confirm)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Esc, KeyModifiers::NONE, Context::Confirm),
            Some(Action::Deny)
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('q'), KeyModifiers::NONE, Context::Confirm),
            None
        );
    }

    #[test]
    fn test_apply_overrides_valid() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([("quit".to_string(), "Ctrl+q".to_string())]);

        let warnings = reg.apply_overrides(&overrides);
        assert!(warnings.is_empty());

        assert_eq!(
            reg.action_for_key(KeyCode::Char('q'), KeyModifiers::NONE, Context::Global),
            None
        );
        assert_eq!(
            reg.action_for_key(KeyCode::Char('q'), KeyModifiers::CONTROL, Context::Global),
            Some(Action::Quit)
        );
    }

    #[test]
    fn test_override_rebinds_every_context() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([("back".to_string(), "F2".to_string())]);
        reg.apply_overrides(&overrides);

        for ctx in [Context::Global, Context::Form, Context::Help] {
            assert_eq!(
                reg.action_for_key(KeyCode::F(2), KeyModifiers::NONE, ctx),
                Some(Action::Back),
                "{:?}",
                ctx
            );
        }
    }

    #[test]
    fn test_apply_overrides_warnings() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([
            ("nonexistent_action".to_string(), "q".to_string()),
            ("refresh".to_string(), "NotAKey".to_string()),
        ]);

        let warnings = reg.apply_overrides(&overrides);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("Unknown action"));
        assert!(warnings[1].contains("Cannot parse key"));
        // Failed override leaves the default in place
        assert_eq!(
            reg.action_for_key(KeyCode::Char('r'), KeyModifiers::NONE, Context::Global),
            Some(Action::Refresh)
        );
    }

    #[test]
    fn test_parse_key_string() {
        assert_eq!(parse_key_string("q"), Some(KeySpec::ch('q')));
        assert_eq!(parse_key_string("Ctrl+S"), Some(KeySpec::ctrl('s')));
        assert_eq!(parse_key_string("F5"), Some(KeySpec::plain(KeyCode::F(5))));
        assert_eq!(parse_key_string("f13"), None);
        assert_eq!(parse_key_string("Enter"), Some(KeySpec::plain(KeyCode::Enter)));
        assert_eq!(
            parse_key_string("Shift+Tab"),
            Some(KeySpec::new(KeyCode::BackTab, KeyModifiers::SHIFT))
        );
        assert_eq!(parse_key_string("é"), Some(KeySpec::ch('é')));
        assert_eq!(parse_key_string("Ctrl+ab"), None);
        assert_eq!(parse_key_string(""), None);
    }

    #[test]
    fn test_format_key() {
        assert_eq!(format_key(&KeySpec::ctrl('s')), "Ctrl+s");
        assert_eq!(format_key(&KeySpec::new(KeyCode::BackTab, KeyModifiers::SHIFT)), "Shift+Tab");
        assert_eq!(format_key(&KeySpec::ch(' ')), "Space");
    }

    #[test]
    fn test_all_bindings_cover_every_context() {
        let reg = KeybindingRegistry::new();
        let bindings = reg.all_bindings();
        for ctx in [Context::Global, Context::Form, Context::Confirm, Context::Help] {
            assert!(bindings.iter().any(|(c, _, _)| *c == ctx), "{:?}", ctx);
        }
    }
}
