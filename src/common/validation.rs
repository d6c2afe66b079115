// src/common/validation.rs
// Validações customizadas para campos decimais (usadas com #[validate(custom(...))])

use rust_decimal::Decimal;
use validator::ValidationError;

// Escalas das colunas NUMERIC(12,2)/(15,2) e NUMERIC(12,3)
pub const MONEY_SCALE: u32 = 2;
pub const QUANTITY_SCALE: u32 = 3;

/// Casas decimais significativas além do que a coluna guarda.
pub fn exceeds_scale(val: &Decimal, scale: u32) -> bool {
    val.normalize().scale() > scale
}

fn scale_error(message: &'static str, scale: u32) -> ValidationError {
    let mut err = ValidationError::new("scale");
    err.add_param("max".into(), &scale);
    err.message = Some(message.into());
    err
}

pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("must_not_be_negative".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("must_be_positive".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_percentage(val: &Decimal) -> Result<(), ValidationError> {
    if *val < Decimal::ZERO || *val > Decimal::ONE_HUNDRED {
        let mut err = ValidationError::new("range");
        err.message = Some("invalid_percentage".into());
        return Err(err);
    }
    Ok(())
}

/// Valor monetário positivo com no máximo 2 casas.
pub fn validate_money_amount(val: &Decimal) -> Result<(), ValidationError> {
    validate_positive(val)?;
    if exceeds_scale(val, MONEY_SCALE) {
        return Err(scale_error("too_many_money_decimals", MONEY_SCALE));
    }
    Ok(())
}

/// Valor monetário não negativo com no máximo 2 casas.
pub fn validate_money(val: &Decimal) -> Result<(), ValidationError> {
    validate_not_negative(val)?;
    if exceeds_scale(val, MONEY_SCALE) {
        return Err(scale_error("too_many_money_decimals", MONEY_SCALE));
    }
    Ok(())
}

/// Quantidade positiva com no máximo 3 casas.
pub fn validate_quantity(val: &Decimal) -> Result<(), ValidationError> {
    validate_positive(val)?;
    if exceeds_scale(val, QUANTITY_SCALE) {
        return Err(scale_error("too_many_quantity_decimals", QUANTITY_SCALE));
    }
    Ok(())
}

// Saldo alvo de um ajuste: zero é permitido
pub fn validate_stock_level(val: &Decimal) -> Result<(), ValidationError> {
    validate_not_negative(val)?;
    if exceeds_scale(val, QUANTITY_SCALE) {
        return Err(scale_error("too_many_quantity_decimals", QUANTITY_SCALE));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn zero_is_not_negative_but_not_positive() {
        assert!(validate_not_negative(&dec!(0)).is_ok());
        assert!(validate_positive(&dec!(0)).is_err());
        assert!(validate_not_negative(&dec!(-0.01)).is_err());
        assert!(validate_positive(&dec!(0.001)).is_ok());
    }

    #[test]
    fn percentage_bounds_are_inclusive() {
        assert!(validate_percentage(&dec!(0)).is_ok());
        assert!(validate_percentage(&dec!(100)).is_ok());
        assert!(validate_percentage(&dec!(100.01)).is_err());
        assert!(validate_percentage(&dec!(-1)).is_err());
    }

    #[test]
    fn sub_cent_amounts_are_rejected() {
        assert!(validate_money_amount(&dec!(10.00)).is_ok());
        assert!(validate_money_amount(&dec!(10.50000)).is_ok());
        let err = validate_money_amount(&dec!(10.005)).unwrap_err();
        assert_eq!(err.code, "scale");
        assert!(validate_money_amount(&dec!(0.004)).is_err());
        assert!(validate_money(&dec!(0)).is_ok());
        assert!(validate_money(&dec!(99.999)).is_err());
    }

    #[test]
    fn sub_milli_quantities_are_rejected() {
        assert!(validate_quantity(&dec!(1.250)).is_ok());
        assert!(validate_quantity(&dec!(0.0004)).is_err());
        assert!(validate_quantity(&dec!(2.0005)).is_err());
        assert!(validate_stock_level(&dec!(0)).is_ok());
        assert!(validate_stock_level(&dec!(3.1415)).is_err());
    }
}
