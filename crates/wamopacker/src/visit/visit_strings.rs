use super::VisitMut;
use crate::value::Value;

/// Recursively visit all string leaves mutably
///
/// Mapping keys are not visited. Visiting stops at the first error.
pub trait VisitStringsMut {
    fn visit_strings_mut<E>(&mut self, visitor: &mut dyn VisitMut<String, E>) -> Result<(), E>;
}

impl VisitStringsMut for Value {
    fn visit_strings_mut<E>(&mut self, visitor: &mut dyn VisitMut<String, E>) -> Result<(), E> {
        match self {
            Value::String(string) => visitor.visit_mut(string),
            Value::Array(array) => {
                for value in array {
                    value.visit_strings_mut(visitor)?;
                }
                Ok(())
            }
            Value::Object(object) => {
                for value in object.values_mut() {
                    value.visit_strings_mut(visitor)?;
                }
                Ok(())
            }
            Value::Null | Value::Boolean(_) | Value::Number(_) => Ok(()),
        }
    }
}
