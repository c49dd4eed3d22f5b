/// Implements the conversions and formatting shared by newtypes over [`FieldElement`].
///
/// [`FieldElement`]: crate::field::FieldElement
macro_rules! impl_field_wrapper {
    ($wrapper:ident) => {
        impl ::std::convert::From<$crate::field::FieldElement> for $wrapper {
            fn from(value: $crate::field::FieldElement) -> Self {
                Self(value)
            }
        }

        impl ::std::convert::From<$wrapper> for $crate::field::FieldElement {
            fn from(value: $wrapper) -> Self {
                value.0
            }
        }

        impl ::std::str::FromStr for $wrapper {
            type Err = $crate::errors::ParseError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                s.parse::<$crate::field::FieldElement>().map(Self)
            }
        }

        impl ::core::fmt::Debug for $wrapper {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}({})", stringify!($wrapper), self.0)
            }
        }

        impl ::core::fmt::Display for $wrapper {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}
