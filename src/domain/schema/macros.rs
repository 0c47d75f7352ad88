//! Declarative macros for table rows and projections.
//!
//! - **`row!`** - declares a row struct together with its column enum, its
//!   all-optional patch struct and the `Row`/wildcard `Projection` impls
//! - **`pick!`** - declares an explicit projection: listed columns required,
//!   the rest of the row carried as a flattened patch
//!
//! # Usage
//!
//! ```ignore
//! row! {
//!     /// A product listing.
//!     pub struct Product in "Product_Information" {
//!         id: ProductId => Id,
//!         is_listed @ "isListed": bool => IsListed,
//!     }
//!     columns ProductColumn;
//!     patch ProductPatch;
//! }
//!
//! pick! {
//!     pub struct ProductTitle from Product {
//!         id: ProductId = ProductColumn::Id,
//!         title: String = ProductColumn::Title,
//!     }
//! }
//! ```

/// Declares a row type bound to a backend table.
///
/// Generates:
/// - the row struct (all columns present)
/// - a `Copy` column enum implementing `Column`
/// - a patch struct where every column is `Option`, skipped when `None`
/// - `impl Row` and the wildcard `impl Projection<Self>`
///
/// A column whose wire name differs from the field name is written
/// `field @ "wireName": Type => Variant`.
#[macro_export]
macro_rules! row {
    (
        $(#[$meta:meta])*
        pub struct $name:ident in $table:literal {
            $(
                $(#[$fmeta:meta])*
                $field:ident $(@ $wire:literal)?: $ty:ty => $variant:ident
            ),+ $(,)?
        }
        columns $column:ident;
        patch $patch:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $name {
            $(
                $(#[$fmeta])*
                $(#[serde(rename = $wire)])?
                pub $field: $ty,
            )+
        }

        #[doc = concat!("Columns of `", $table, "`.")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $column {
            $($variant,)+
        }

        impl $crate::domain::schema::Column for $column {
            fn name(&self) -> &'static str {
                match self {
                    $($column::$variant => $crate::__column_name!($field $(, $wire)?),)+
                }
            }

            fn all() -> &'static [Self] {
                &[$($column::$variant),+]
            }
        }

        #[doc = concat!("Partial `", stringify!($name), "`: projection remainder and update body.")]
        #[derive(Debug, Clone, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $patch {
            $(
                #[serde(default, skip_serializing_if = "Option::is_none")]
                $(#[serde(rename = $wire)])?
                pub $field: Option<$ty>,
            )+
        }

        impl $crate::domain::schema::Row for $name {
            const TABLE: &'static str = $table;
            type Column = $column;
            type Patch = $patch;
        }

        impl $crate::domain::query::Projection<$name> for $name {
            fn select_list() -> $crate::domain::query::SelectList<$column> {
                $crate::domain::query::SelectList::Wildcard
            }
        }
    };
}

/// Declares an explicit projection over a row type.
///
/// Listed fields are required in the response. Every other column of the row
/// is reachable through `rest`, present only if the backend sent it.
#[macro_export]
macro_rules! pick {
    (
        $(#[$meta:meta])*
        pub struct $name:ident from $row:ty {
            $(
                $field:ident $(@ $wire:literal)?: $ty:ty = $column:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, ::serde::Deserialize)]
        pub struct $name {
            $(
                $(#[serde(rename = $wire)])?
                pub $field: $ty,
            )+
            #[serde(flatten)]
            pub rest: <$row as $crate::domain::schema::Row>::Patch,
        }

        impl $crate::domain::query::Projection<$row> for $name {
            fn select_list(
            ) -> $crate::domain::query::SelectList<<$row as $crate::domain::schema::Row>::Column> {
                $crate::domain::query::SelectList::columns([$($column),+])
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __column_name {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $wire:literal) => {
        $wire
    };
}
