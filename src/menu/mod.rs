//! USSD navigation: the `Menu` trait, its transitions, and the stack engine.
//!
//! A menu never holds the engine. It returns a [`Transition`] from
//! `handle_input` and the [`Navigator`] applies it, so the stack is only
//! mutated in one place.

pub mod main_menu;
pub mod prompts;
pub mod submenus;

use tracing::debug;

use crate::error::{Result, UssdError};

pub use main_menu::MainMenu;

/// What the presentation layer draws for one render cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub title: String,
    pub lines: Vec<String>,
}

/// Out-of-band message shown after handling an input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Success(String),
    Error(String),
}

/// Stack effect requested by a menu
pub enum Transition {
    /// Re-render the same menu
    Stay,
    /// Make a new child menu current
    Push(Box<dyn Menu>),
    /// Pop one level (never past the root)
    Back,
    /// Drop everything above the root
    Home,
    /// End the session normally
    Quit,
}

impl std::fmt::Debug for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transition::Stay => write!(f, "Stay"),
            Transition::Push(menu) => write!(f, "Push({})", menu.title()),
            Transition::Back => write!(f, "Back"),
            Transition::Home => write!(f, "Home"),
            Transition::Quit => write!(f, "Quit"),
        }
    }
}

#[derive(Debug)]
pub struct Outcome {
    pub transition: Transition,
    pub notice: Option<Notice>,
}

impl Outcome {
    pub fn stay() -> Self {
        Self { transition: Transition::Stay, notice: None }
    }

    pub fn push(menu: impl Menu + 'static) -> Self {
        Self { transition: Transition::Push(Box::new(menu)), notice: None }
    }

    pub fn back() -> Self {
        Self { transition: Transition::Back, notice: None }
    }

    pub fn home() -> Self {
        Self { transition: Transition::Home, notice: None }
    }

    pub fn quit() -> Self {
        Self { transition: Transition::Quit, notice: None }
    }

    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }
}

/// One node of the USSD tree.
pub trait Menu: Send {
    /// Path segment used in breadcrumbs ("1", "montant", ...)
    fn key(&self) -> &str;

    fn title(&self) -> String;

    /// Selectable labels, numbered from 1 when rendered
    fn options(&self) -> Vec<String>;

    /// Content drawn above the options
    fn lines(&self) -> Vec<String> {
        Vec::new()
    }

    fn prompt(&self) -> &str {
        "Votre choix: "
    }

    /// Interpret one raw line. Recoverable errors leave the stack as it is.
    fn handle_input(&mut self, input: &str) -> Result<Outcome>;

    fn screen(&self) -> Screen {
        let mut lines = self.lines();
        if !lines.is_empty() && !self.options().is_empty() {
            lines.push(String::new());
        }
        lines.extend(
            self.options()
                .iter()
                .enumerate()
                .map(|(i, opt)| format!("{}. {}", i + 1, opt)),
        );
        Screen { title: self.title(), lines }
    }
}

/// Parse a 1-based option number. Anything else, including out-of-range
/// numbers, is `InvalidSelection`.
pub fn parse_choice(input: &str, option_count: usize) -> Result<usize> {
    let choice: usize = input.trim().parse().map_err(|_| UssdError::InvalidSelection)?;
    if choice == 0 || choice > option_count {
        return Err(UssdError::InvalidSelection);
    }
    Ok(choice)
}

/// Result of dispatching one line through the engine
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Dispatch {
    pub notice: Option<Notice>,
    pub quit: bool,
}

/// Stack of menus, root first. The root is never popped.
pub struct Navigator {
    stack: Vec<Box<dyn Menu>>,
}

impl Navigator {
    pub fn new(root: Box<dyn Menu>) -> Self {
        Self { stack: vec![root] }
    }

    pub fn current(&self) -> &dyn Menu {
        // stack is never empty
        self.stack[self.stack.len() - 1].as_ref()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_at_root(&self) -> bool {
        self.stack.len() == 1
    }

    /// Breadcrumb of the keys below the root, e.g. `2-mvola-montant`
    pub fn path(&self) -> String {
        self.stack[1..]
            .iter()
            .map(|m| m.key())
            .collect::<Vec<_>>()
            .join("-")
    }

    pub fn navigate_to(&mut self, menu: Box<dyn Menu>) {
        self.stack.push(menu);
        debug!(path = %self.path(), "navigate");
    }

    pub fn go_back(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
            debug!(path = %self.path(), "back");
        }
    }

    pub fn reset_to_root(&mut self) {
        self.stack.truncate(1);
        debug!("back to root");
    }

    /// Forward `raw` to the current menu and apply the transition it asks for.
    /// Errors come from the menu and leave the stack untouched.
    pub fn handle_input(&mut self, raw: &str) -> Result<Dispatch> {
        let top = self.stack.len() - 1;
        let outcome = self.stack[top].handle_input(raw)?;

        let mut quit = false;
        match outcome.transition {
            Transition::Stay => {}
            Transition::Push(menu) => self.navigate_to(menu),
            Transition::Back => self.go_back(),
            Transition::Home => self.reset_to_root(),
            Transition::Quit => quit = true,
        }

        Ok(Dispatch { notice: outcome.notice, quit })
    }
}
