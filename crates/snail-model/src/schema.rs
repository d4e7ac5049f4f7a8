/// Declares how a record type is stored.
///
/// Implementors are usually unit structs; the mappers are generic over them.
pub trait Schema: Send + Sync + 'static {
    /// Collection (document variant) or table (key-value variant) name.
    const COLLECTION: &'static str;

    /// Fields that must be present and truthy when a record is created.
    const REQUIRED_FIELDS: &'static [&'static str] = &[];

    /// Expose a document's `_id` as a plain `id` attribute.
    const OUTPUT_ID: bool = true;
}
