/// Declares a field-less enum whose discriminants are the raw register
/// values, along with `from_u8` and an `ALL` list in declaration order.
#[macro_export]
macro_rules! c_like_enum {
    (
        $(#[$meta: meta])*
        $name: ident {
            $( $(#[$vmeta: meta])* $variant: ident = $value: expr, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value, )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn from_u8(value: u8) -> Option<$name> {
                match value {
                    $(v if v == $value => Some($name::$variant),)+
                    _ => None
                }
            }

            pub fn as_u8(self) -> u8 {
                self as u8
            }
        }
    };
}
