//! Macros for ergonomic label declarations.

/// Declare a fieldless enum usable as a trigger or state name.
///
/// Derives everything the engine needs plus serde, and adds `ALL`, `as_str`
/// and `Display`.
///
/// # Example
///
/// ```
/// use sidetrack::label_enum;
///
/// label_enum! {
///     pub enum Phase {
///         Idle,
///         Running,
///     }
/// }
///
/// assert_eq!(Phase::Running.as_str(), "Running");
/// assert_eq!(Phase::ALL, &[Phase::Idle, Phase::Running]);
/// assert_eq!(Phase::Idle.to_string(), "Idle");
/// ```
#[macro_export]
macro_rules! label_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize,
        )]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}
