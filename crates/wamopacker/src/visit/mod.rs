//! visitor pattern helpers
mod visit_strings;
pub use visit_strings::VisitStringsMut;

/// Visitor that visits its subjects mutably and may fail
pub trait VisitMut<T, E> {
    fn visit_mut(&mut self, value: &mut T) -> Result<(), E>;
}

// blanket impl for FnMut
impl<T, E, F> VisitMut<T, E> for F
where
    F: FnMut(&mut T) -> Result<(), E>,
{
    fn visit_mut(&mut self, value: &mut T) -> Result<(), E> {
        self(value)
    }
}
