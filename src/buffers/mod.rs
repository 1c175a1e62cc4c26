//! Column-oriented batch buffers and the type-code/native-CLI-type mapping used to
//! size and bind them.

mod description;
mod multi_value_buffer;

pub use description::{
    bytes_required, make_description, make_description_for_type, make_fallback_description,
    Description, Kind, TypeCode, DATE_STRUCT_SIZE, TIMESTAMP_STRUCT_SIZE,
};
pub use multi_value_buffer::{move_to_top, MultiValueBuffer, NULL_SENTINEL};

/// A result column's resolved shape, exposed to downstream consumers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub type_code: TypeCode,
    pub element_size: usize,
    pub nullable: bool,
}

impl From<&Description> for ColumnInfo {
    fn from(description: &Description) -> Self {
        ColumnInfo {
            name: description.name.clone(),
            type_code: description.type_code(),
            element_size: description.element_size(),
            nullable: description.nullable,
        }
    }
}
