//! Helper macro for generating driven-port error enums.
//!
//! Each variant gets a snake_case constructor whose field parameters accept
//! `impl Into<T>`, so call sites can pass `&str` for `String` fields.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant { $($field: $field.into()),* }
            }
        }
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
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
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for generated constructors.
    define_port_error! {
        pub enum SamplePortError {
            SoldOut => "sold out",
            Connection { message: String } => "connection failed: {message}",
            Capacity { flight: String, seats: i32 } => "flight {flight} has {seats} seats",
        }
    }

    #[test]
    fn unit_variants_get_nullary_constructors() {
        assert_eq!(SamplePortError::sold_out(), SamplePortError::SoldOut);
    }

    #[test]
    fn string_fields_accept_str() {
        let err = SamplePortError::connection("pool closed");
        assert_eq!(err.to_string(), "connection failed: pool closed");
    }

    #[test]
    fn mixed_fields_keep_their_types() {
        let err = SamplePortError::capacity("AA/101", 2_i32);
        assert_eq!(err.to_string(), "flight AA/101 has 2 seats");
    }
}
