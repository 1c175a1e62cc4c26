use odbc_sys::{Handle, HandleType};

/// Implemented by every owning handle wrapper so diagnostics extraction
/// ([`super::Record::from_handle`]) can work generically across environment,
/// connection, and statement handles.
pub trait AsHandle {
    fn as_handle(&self) -> Handle;
    fn handle_type(&self) -> HandleType;
}
