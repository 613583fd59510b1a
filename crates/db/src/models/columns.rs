//! Decoding support for nullable `TEXT` columns backed by core enums.
//!
//! Non-null enum columns decode through `#[sqlx(try_from = "String")]`
//! directly. `Option<Enum>` cannot implement `TryFrom<Option<String>>`,
//! so nullable columns go through [`NullableText`] instead.

use std::str::FromStr;

use buildcrm_core::error::CoreError;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgTypeInfo, PgValueRef};
use sqlx::{Decode, Postgres, Type};

/// Raw value of a nullable `TEXT` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullableText(pub Option<String>);

impl Type<Postgres> for NullableText {
    fn type_info() -> PgTypeInfo {
        <String as Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for NullableText {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        Ok(Self(<Option<String> as Decode<'r, Postgres>>::decode(value)?))
    }
}

impl<T> TryFrom<NullableText> for Option<T>
where
    T: FromStr<Err = CoreError>,
{
    type Error = CoreError;

    fn try_from(raw: NullableText) -> Result<Self, Self::Error> {
        raw.0.map(|value| value.parse()).transpose()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use buildcrm_core::status::RiskLevel;

    use super::*;

    #[test]
    fn null_decodes_to_none() {
        let level: Option<RiskLevel> = NullableText(None).try_into().unwrap();
        assert_eq!(level, None);
    }

    #[test]
    fn known_value_decodes() {
        let level: Option<RiskLevel> = NullableText(Some("high".into())).try_into().unwrap();
        assert_eq!(level, Some(RiskLevel::High));
    }

    #[test]
    fn unknown_value_is_rejected() {
        let result: Result<Option<RiskLevel>, _> = NullableText(Some("extreme".into())).try_into();
        assert_matches!(result, Err(CoreError::Validation(_)));
    }
}
