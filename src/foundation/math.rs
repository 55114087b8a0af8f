pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u8, y: u8) -> u8 {
    mul_div255_u16(u16::from(x), u16::from(y)) as u8
}

/// Inverse of premultiplication for one 8-bit channel. A zero alpha maps to zero.
pub(crate) fn unpremul_u8(c: u8, a: u8) -> u8 {
    if a == 0 {
        return 0;
    }
    let v = (u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a);
    v.min(255) as u8
}

pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9
}

pub(crate) fn is_integral(v: f64) -> bool {
    (v - v.round()).abs() <= 1e-6
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
