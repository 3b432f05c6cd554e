/// Generates a wire enumeration backed by a single integer code.
///
/// Every named variant maps to a fixed code. Codes with no named variant are
/// preserved in a `Reserved` variant, so decoding and re-encoding a value is
/// always lossless even when a peer speaks a newer revision of the library.
///
/// # Arguments
///
/// * `$name:ident` - The name of the enum to be generated.
/// * `$variant:ident = $value:literal` - A comma-separated list of named enum
///   variants and their wire codes.
/// * `$unit:ident` - The underlying integer type (e.g. `u8`, `u16`).
///
/// # Example
///
/// ```rust
/// use zcl_foundation::generate_wire_enum;
///
/// generate_wire_enum! {
///     Color {
///         Red = 1,
///         Green = 2,
///     },
///     u8
/// }
///
/// assert_eq!(u8::from(Color::Green), 2);
/// assert_eq!(Color::from(1u8), Color::Red);
/// assert_eq!(format!("{}", Color::Red), "Red");
/// assert_eq!(Color::from_name("Green"), Some(Color::Green));
///
/// match Color::from(9u8) {
///     Color::Reserved(value) => assert_eq!(value.value(), 9),
///     other => panic!("unexpected {:?}", other),
/// }
/// ```
///
/// # Generated Code Structure
///
/// * The named variants, plus `Reserved(<Name>Value)` for unassigned codes.
/// * `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash` for the enum.
/// * `core::fmt::Display`: named variants print their name, reserved codes
///   print as `Reserved(0x..)`.
/// * `From<$name> for $unit` and `From<$unit> for $name`.
/// * `is_reserved()` to test for unassigned codes.
/// * `from_name()` to resolve a symbolic name to its variant.
#[macro_export]
macro_rules! generate_wire_enum {
    ($(#[$doc:meta])* $name:ident { $($(#[$vdoc:meta])* $variant:ident = $value:literal,)+ }, $unit:ident) => {
        pastey::paste! {
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub enum $name {
                $($(#[$vdoc])* $variant,)*
                Reserved( [<$name Value>] ),
            }

            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub struct [<$name Value>] { value: $unit }

            impl [<$name Value>] {
                fn new(value: $unit) -> Self {
                    Self { value }
                }

                pub fn value(&self) -> $unit {
                    self.value
                }
            }

            impl $name {
                /// Whether this code has no assigned meaning
                pub fn is_reserved(&self) -> bool {
                    matches!(self, $name::Reserved(_))
                }

                /// Look a named variant up by its symbolic name
                pub fn from_name(name: &str) -> Option<Self> {
                    $(
                        if name == stringify!($variant) {
                            return Some($name::$variant);
                        }
                    )*
                    None
                }
            }

            impl core::fmt::Display for $name {
                fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                    match self {
                        $($name::$variant => write!(f, "{}", stringify!($variant)),)*
                        $name::Reserved( value ) => write!(f, "Reserved({:#04x})", value.value()),
                    }
                }
            }

            impl From<$name> for $unit {
                fn from(value: $name) -> Self {
                    match value {
                        $($name::$variant => $value,)*
                        $name::Reserved( value ) => value.value(),
                    }
                }
            }

            impl From<$unit> for $name {
                fn from(value: $unit) -> Self {
                    match value {
                        $($value => $name::$variant,)*
                        v => $name::Reserved( [<$name Value>]::new(v) ),
                    }
                }
            }
        }
    };
}
