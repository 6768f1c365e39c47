// 2.0: fixed point math. every rate, price and amount in the core is an 18 decimal
// scaled integer. products are taken at 256 bits and divided once, so nothing
// loses precision between the multiply and the final division.
// 2.1 has the free mul/div helpers, 2.2 Wad, 2.3 SignedWad, 2.4 asset adapters.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uint::construct_uint;

construct_uint! {
    /// 256 bit unsigned integer used only for intermediate products.
    pub struct U256(4);
}

pub const DECIMALS: u32 = 18;
pub const WAD: u128 = 1_000_000_000_000_000_000;
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// `SECONDS_PER_YEAR` scaled to 18 decimals. a quasi price of this value is an IBT price of 1.0.
pub const YEAR_IN_SECONDS_WAD: u128 = SECONDS_PER_YEAR as u128 * WAD;

fn pow10(exp: u32) -> Option<u128> {
    10u128.checked_pow(exp)
}

fn narrow(value: U256) -> Option<u128> {
    if value > U256::from(u128::MAX) {
        None
    } else {
        Some(value.as_u128())
    }
}

// 2.1: a * b / d with one truncating division. None on zero divisor or a result wider than 128 bits.
pub fn mul_div(a: u128, b: u128, divisor: u128) -> Option<u128> {
    if divisor == 0 {
        return None;
    }
    let product = U256::from(a) * U256::from(b);
    narrow(product / U256::from(divisor))
}

// half up, same as token transfers round: (x + d/2) / d
pub fn mul_div_round(a: u128, b: u128, divisor: u128) -> Option<u128> {
    if divisor == 0 {
        return None;
    }
    let divisor = U256::from(divisor);
    let product = U256::from(a) * U256::from(b);
    narrow((product + divisor / 2) / divisor)
}

pub fn mul3_div(a: u128, b: u128, c: u128, divisor: u128) -> Option<u128> {
    if divisor == 0 {
        return None;
    }
    let product = (U256::from(a) * U256::from(b)).checked_mul(U256::from(c))?;
    narrow(product / U256::from(divisor))
}

// (wa * va + wb * vb) / (wa + wb). zero when both weights are zero.
pub fn weighted_average(weight_a: u128, value_a: u128, weight_b: u128, value_b: u128) -> Option<u128> {
    let total = weight_a.checked_add(weight_b)?;
    if total == 0 {
        return Some(0);
    }
    let sum = (U256::from(weight_a) * U256::from(value_a))
        .checked_add(U256::from(weight_b) * U256::from(value_b))?;
    narrow(sum / U256::from(total))
}

// inverse of weighted_average: drops (weight, value) from an average over total_weight.
// the numerator floors at zero since the stored average was truncated.
pub fn weighted_average_without(total_weight: u128, average: u128, weight: u128, value: u128) -> Option<u128> {
    let remaining = total_weight.checked_sub(weight)?;
    if remaining == 0 {
        return Some(0);
    }
    let whole = U256::from(total_weight) * U256::from(average);
    let part = U256::from(weight) * U256::from(value);
    let numerator = if whole > part { whole - part } else { U256::zero() };
    narrow(numerator / U256::from(remaining))
}

// signed variant, truncates toward zero
pub fn signed_mul_div(a: i128, b: u128, divisor: u128) -> Option<i128> {
    let magnitude = mul_div(a.unsigned_abs(), b, divisor)?;
    apply_sign(magnitude, a < 0)
}

fn apply_sign(magnitude: u128, negative: bool) -> Option<i128> {
    if negative {
        if magnitude == i128::MIN.unsigned_abs() {
            Some(i128::MIN)
        } else {
            i128::try_from(magnitude).ok().map(|m| -m)
        }
    } else {
        i128::try_from(magnitude).ok()
    }
}

// 2.2: unsigned 18 decimal quantity. rates (0.03 = 3%), prices, notionals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wad(u128);

impl Wad {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(WAD);
    pub const MAX: Self = Self(u128::MAX);

    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u128 {
        self.0
    }

    pub fn from_int(units: u64) -> Self {
        Self(units as u128 * WAD)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(&self, other: Wad) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(&self, other: Wad) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_add(&self, other: Wad) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(&self, other: Wad) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Wad-scaled product, truncating.
    pub fn mul(&self, other: Wad) -> Option<Self> {
        mul_div(self.0, other.0, WAD).map(Self)
    }

    /// Wad-scaled quotient, truncating. None when `other` is zero.
    pub fn div(&self, other: Wad) -> Option<Self> {
        mul_div(self.0, WAD, other.0).map(Self)
    }

    /// Like `div`, but a quotient too wide for 128 bits clamps to `MAX`.
    /// None only when `other` is zero.
    pub fn saturating_div(&self, other: Wad) -> Option<Self> {
        if other.is_zero() {
            return None;
        }
        Some(self.div(other).unwrap_or(Self::MAX))
    }

    pub fn to_signed(&self) -> Option<SignedWad> {
        i128::try_from(self.0).ok().map(SignedWad)
    }

    pub fn from_decimal(value: Decimal) -> Option<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return None;
        }
        let mantissa = u128::try_from(value.mantissa()).ok()?;
        let scale = value.scale();
        let raw = if scale <= DECIMALS {
            mantissa.checked_mul(pow10(DECIMALS - scale)?)?
        } else {
            mantissa / pow10(scale - DECIMALS)?
        };
        Some(Self(raw))
    }

    pub fn to_decimal(&self) -> Option<Decimal> {
        let raw = i128::try_from(self.0).ok()?;
        Decimal::try_from_i128_with_scale(raw, DECIMALS)
            .ok()
            .map(|d| d.normalize())
    }

    // 2.4: asset adapters. USDT/USDC move 6 decimal amounts, DAI moves 18.
    pub fn to_asset_amount(&self, decimals: u32) -> Option<u128> {
        if decimals >= DECIMALS {
            self.0.checked_mul(pow10(decimals - DECIMALS)?)
        } else {
            mul_div_round(self.0, 1, pow10(DECIMALS - decimals)?)
        }
    }

    pub fn from_asset_amount(amount: u128, decimals: u32) -> Option<Self> {
        if decimals <= DECIMALS {
            amount.checked_mul(pow10(DECIMALS - decimals)?).map(Self)
        } else {
            mul_div_round(amount, 1, pow10(decimals - DECIMALS)?).map(Self)
        }
    }
}

fn write_scaled(f: &mut fmt::Formatter<'_>, negative: bool, magnitude: u128) -> fmt::Result {
    let int_part = magnitude / WAD;
    let frac_part = magnitude % WAD;
    let sign = if negative { "-" } else { "" };
    if frac_part == 0 {
        return write!(f, "{}{}", sign, int_part);
    }
    let frac = format!("{:018}", frac_part);
    write!(f, "{}{}.{}", sign, int_part, frac.trim_end_matches('0'))
}

impl fmt::Display for Wad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_scaled(f, false, self.0)
    }
}

// 2.3: signed 18 decimal quantity. payoffs and SOAP go negative, nothing else does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedWad(i128);

impl SignedWad {
    pub const ZERO: Self = Self(0);

    pub const fn from_raw(raw: i128) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> i128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn abs(&self) -> Wad {
        Wad(self.0.unsigned_abs())
    }

    pub fn negate(&self) -> Self {
        Self(self.0.saturating_neg())
    }

    pub fn checked_add(&self, other: SignedWad) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(&self, other: SignedWad) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Wad-scaled product with an unsigned factor, truncating toward zero.
    pub fn mul(&self, factor: Wad) -> Option<Self> {
        signed_mul_div(self.0, factor.raw(), WAD).map(Self)
    }

    /// Negative values clamp to zero.
    pub fn to_unsigned_floor(&self) -> Wad {
        if self.0 < 0 {
            Wad::ZERO
        } else {
            Wad(self.0 as u128)
        }
    }

    pub fn from_decimal(value: Decimal) -> Option<Self> {
        let magnitude = Wad::from_decimal(value.abs())?;
        apply_sign(magnitude.raw(), value.is_sign_negative()).map(Self)
    }

    pub fn to_decimal(&self) -> Option<Decimal> {
        Decimal::try_from_i128_with_scale(self.0, DECIMALS)
            .ok()
            .map(|d| d.normalize())
    }
}

impl From<Wad> for SignedWad {
    // saturates above i128::MAX, which is ~1.7e20 whole units
    fn from(value: Wad) -> Self {
        Self(i128::try_from(value.raw()).unwrap_or(i128::MAX))
    }
}

impl fmt::Display for SignedWad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_scaled(f, self.0 < 0, self.0.unsigned_abs())
    }
}
