//! Defines helper macros for generating domain port error enums.
//!
//! Each variant gets a snake-case constructor accepting `impl Into<T>` for its
//! fields. A variant tagged `as transient` reports `is_transient() == true`,
//! which services use to tell retry-later conditions apart from hard failures.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };

    (@transient transient) => { true };
    (@transient) => { false };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )?
                    => $message:literal $( as $kind:ident )?
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*

            /// Whether the failure is transient and the caller may retry later.
            pub fn is_transient(&self) -> bool {
                match self {
                    $(
                        Self::$variant { .. } => define_port_error!(@transient $($kind)?),
                    )*
                }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    define_port_error! {
        pub enum ExamplePortError {
            Offline { message: String } => "offline: {message}" as transient,
            Rejected { code: u32 } => "rejected: {code}",
            Mixed { message: String, code: u32 } => "mixed: {message} ({code})",
            Gone => "gone",
        }
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = ExamplePortError::offline("link down");
        assert_eq!(err.to_string(), "offline: link down");
    }

    #[test]
    fn constructors_support_mixed_and_unit_variants() {
        assert_eq!(ExamplePortError::mixed("hello", 7_u32).to_string(), "mixed: hello (7)");
        assert_eq!(ExamplePortError::gone().to_string(), "gone");
    }

    #[test]
    fn only_tagged_variants_are_transient() {
        assert!(ExamplePortError::offline("x").is_transient());
        assert!(!ExamplePortError::rejected(1_u32).is_transient());
        assert!(!ExamplePortError::gone().is_transient());
    }
}
