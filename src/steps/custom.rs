//! Custom steps for interactions that are not a list or a text box.

use std::fmt;

use crate::error::Result;
use crate::ui::UserInterface;

use super::Selection;

type ShowFn<'a, T> = Box<dyn FnOnce(&mut dyn UserInterface) -> Result<Selection<T>> + 'a>;

/// A step whose interaction is owned entirely by the caller, such as a
/// native folder chooser.
pub struct CustomStep<'a, T> {
    pub title: String,
    show: ShowFn<'a, T>,
}

impl<T> fmt::Debug for CustomStep<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomStep")
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

impl<'a, T> CustomStep<'a, T> {
    pub(crate) fn run(self, ui: &mut dyn UserInterface) -> Result<Selection<T>> {
        (self.show)(ui)
    }
}

pub fn create_custom_step<'a, T>(
    title: impl Into<String>,
    show: impl FnOnce(&mut dyn UserInterface) -> Result<Selection<T>> + 'a,
) -> CustomStep<'a, T> {
    CustomStep {
        title: title.into(),
        show: Box::new(show),
    }
}
