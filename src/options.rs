use crate::results::BufferSize;

/// Policy knobs threaded through description mapping, parameter-set construction, and
/// result-set construction.
///
/// There is no config-file or CLI-flag layer in this crate (connection-string parsing
/// and configuration loading are a host-application concern) -- an embedding
/// application builds an `Options` directly, usually starting from [`Options::default`].
#[derive(Clone, Debug, PartialEq)]
pub struct Options {
    /// Whether the connection is opened with `SQL_ATTR_AUTOCOMMIT` off (`false`) or
    /// on (`true`, the default).
    pub autocommit: bool,
    /// Prefer binding character columns/parameters as wide (UTF-16) buffers rather
    /// than narrow (byte-encoded) ones.
    pub prefer_unicode: bool,
    /// When set, `WCHAR`/`WVARCHAR`/`WLONGVARCHAR` columns are described as
    /// `NarrowString` rather than `WideString`.
    pub fetch_wchar_as_char: bool,
    /// Column size to assume when the driver reports a `CHAR`/`VARCHAR` column size
    /// of zero (meaning "unknown" or "unbounded").
    pub varchar_max_character_limit: usize,
    /// Cap character column sizes at `varchar_max_character_limit` even when the
    /// driver reports a larger size.
    pub limit_varchar_results_to_max: bool,
    /// Double the character capacity computed for wide string columns, to leave room
    /// for surrogate pairs.
    pub force_extra_capacity_for_unicode: bool,
    /// For `NUMERIC`/`DECIMAL` columns whose precision exceeds 18 digits, prefer a
    /// fixed 64-bit representation over a decimal string when `true`.
    pub large_decimals_as_64_bit_types: bool,
    /// Number of parameter sets (rows) a `BoundParameterSet` buffers before a flush
    /// is required.
    pub parameter_sets_to_buffer: usize,
    /// The row-array size used when constructing a result set.
    pub read_buffer_size: BufferSize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            autocommit: true,
            prefer_unicode: false,
            fetch_wchar_as_char: false,
            varchar_max_character_limit: 4096,
            limit_varchar_results_to_max: false,
            force_extra_capacity_for_unicode: false,
            large_decimals_as_64_bit_types: false,
            parameter_sets_to_buffer: 1000,
            read_buffer_size: BufferSize::Rows(1000),
        }
    }
}
