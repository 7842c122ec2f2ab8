// src/display/extensions.rs

//! Display extension flags derived from the EGL extension string.

use bitflags::bitflags;

bitflags! {
    /// Extensions the backend changes behaviour for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Extensions: u32 {
        /// `EGL_KHR_create_context`: explicit version, profile mask and flags.
        const CREATE_CONTEXT = 1 << 0;
        /// `EGL_KHR_swap_buffers_with_damage`.
        const SWAP_BUFFERS_WITH_DAMAGE = 1 << 1;
    }
}

const KNOWN: [(&str, Extensions); 2] = [
    ("EGL_KHR_create_context", Extensions::CREATE_CONTEXT),
    ("EGL_KHR_swap_buffers_with_damage", Extensions::SWAP_BUFFERS_WITH_DAMAGE),
];

/// Returns `true` if `name` appears as a whole word in `extensions`.
///
/// A prefix match is not enough: `EGL_KHR_create_context_no_error` must not
/// satisfy a query for `EGL_KHR_create_context`.
pub fn check_extension(name: &str, extensions: &str) -> bool {
    !name.is_empty() && extensions.split_ascii_whitespace().any(|ext| ext == name)
}

impl Extensions {
    /// Parses the extensions this backend cares about out of an extension string.
    pub fn parse(extensions: &str) -> Self {
        KNOWN
            .iter()
            .filter(|(name, _)| check_extension(name, extensions))
            .fold(Extensions::empty(), |acc, (_, flag)| acc | *flag)
    }
}
