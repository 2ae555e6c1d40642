use crate::types::SetterFn;
use std::fmt;

///
/// PropertyModel
/// One mapped property of an entity model.
///

#[derive(Clone)]
pub struct PropertyModel {
    name: String,
    storage_name: String,
    is_id: bool,
    setter: Option<SetterFn>,
}

impl PropertyModel {
    #[must_use]
    pub fn new(name: impl Into<String>, storage_name: impl Into<String>, is_id: bool) -> Self {
        Self {
            name: name.into(),
            storage_name: storage_name.into(),
            is_id,
            setter: None,
        }
    }

    #[must_use]
    pub fn with_setter(mut self, setter: Option<SetterFn>) -> Self {
        self.setter = setter;
        self
    }

    /// Name on the application type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field name in stored documents.
    #[must_use]
    pub fn storage_name(&self) -> &str {
        &self.storage_name
    }

    #[must_use]
    pub const fn is_id(&self) -> bool {
        self.is_id
    }

    #[must_use]
    pub const fn setter(&self) -> Option<&SetterFn> {
        self.setter.as_ref()
    }
}

impl fmt::Debug for PropertyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyModel")
            .field("name", &self.name)
            .field("storage_name", &self.storage_name)
            .field("is_id", &self.is_id)
            .finish_non_exhaustive()
    }
}
