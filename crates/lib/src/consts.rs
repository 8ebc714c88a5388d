/// Version of the digest encoding.
///
/// Mixed into every node digest. Bump whenever the field layout in
/// [`crate::util::hash::DigestBuilder`] or the leaf hashing scheme changes so
/// previously published keys stop matching.
pub const CACHE_VERSION: &str = "2";
