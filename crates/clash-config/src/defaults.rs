//! Default values for serde deserialization.

pub const DEFAULT_PROVIDER_INTERVAL_SECS: u64 = 86_400;
pub const DEFAULT_HEALTH_CHECK_URL: &str = "https://www.gstatic.com/generate_204";
pub const DEFAULT_HEALTH_CHECK_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_HEALTH_CHECK_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_MAX_FAILED_TIMES: u32 = 5;
pub const DEFAULT_LAZY: bool = true;

/// Generate default value functions that forward to the constants above.
macro_rules! default_fns {
    ($($fn_name:ident => $const_name:ident : $ty:ty),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> $ty {
                $const_name
            }
        )*
    };
}

default_fns! {
    default_lazy             => DEFAULT_LAZY: bool,
    default_max_failed_times => DEFAULT_MAX_FAILED_TIMES: u32,
}
