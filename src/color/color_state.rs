use serde::{Deserialize, Serialize};

use crate::color::snippet::{OpSnippet, Snippet, SnippetHook};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Colorspace {
    #[default]
    Srgb,
    Bt2020,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferFunction {
    #[default]
    Srgb,
    Pq,
    Bt709,
    Linear,
}

/// Nits of SDR reference white; PQ signals are absolute up to 10000 nits.
const SDR_REFERENCE_WHITE: f32 = 203.0;
const PQ_MAX_LUMINANCE: f32 = 10000.0;

const SRGB_TO_BT2020: [[f32; 3]; 3] = [
    [0.627_404, 0.329_282, 0.043_313_6],
    [0.069_097, 0.919_540, 0.011_361_2],
    [0.016_391_6, 0.088_013_2, 0.895_595],
];

const BT2020_TO_SRGB: [[f32; 3]; 3] = [
    [1.660_491, -0.587_641_1, -0.072_849_9],
    [-0.124_550_5, 1.132_899_9, -0.008_349_4],
    [-0.018_150_8, -0.100_578_9, 1.118_729_7],
];

static SRGB_EOTF: OpSnippet = OpSnippet::from_static(
    "srgb_eotf",
    "vec3 srgb_eotf (vec3 color)
{
  vec3 vsign = sign (color);
  color = abs (color);
  bvec3 is_low = lessThanEqual (color, vec3 (0.04045));
  vec3 lo_part = color / 12.92;
  vec3 hi_part = pow ((color + 0.055) / 1.055, vec3 (12.0 / 5.0));
  return vsign * mix (hi_part, lo_part, is_low);
}
",
);

static SRGB_INV_EOTF: OpSnippet = OpSnippet::from_static(
    "srgb_inv_eotf",
    "vec3 srgb_inv_eotf (vec3 color)
{
  vec3 vsign = sign (color);
  color = abs (color);
  bvec3 is_lo = lessThanEqual (color, vec3 (0.0031308));
  vec3 lo_part = color * 12.92;
  vec3 hi_part = pow (color, vec3 (5.0 / 12.0)) * 1.055 - 0.055;
  return vsign * mix (hi_part, lo_part, is_lo);
}
",
);

static PQ_EOTF: OpSnippet = OpSnippet::from_static(
    "pq_eotf",
    "vec3 pq_eotf (vec3 color)
{
  const float c1 = 0.8359375;
  const float c2 = 18.8515625;
  const float c3 = 18.6875;
  const float oo_m1 = 1.0 / 0.1593017578125;
  const float oo_m2 = 1.0 / 78.84375;
  color = clamp (color, vec3 (0.0), vec3 (1.0));
  vec3 num = max (pow (color, vec3 (oo_m2)) - c1, vec3 (0.0));
  vec3 den = c2 - c3 * pow (color, vec3 (oo_m2));
  return pow (num / den, vec3 (oo_m1));
}
",
);

static PQ_INV_EOTF: OpSnippet = OpSnippet::from_static(
    "pq_inv_eotf",
    "vec3 pq_inv_eotf (vec3 color)
{
  float m1 = 0.1593017578125;
  float m2 = 78.84375;
  float c1 = 0.8359375;
  float c2 = 18.8515625;
  float c3 = 18.6875;
  color = clamp (color, vec3 (0.0), vec3 (1.0));
  vec3 color_pow_m1 = pow (color, vec3 (m1));
  vec3 num = vec3 (c1) + c2 * color_pow_m1;
  vec3 denum = vec3 (1.0) + c3 * color_pow_m1;
  return pow (num / denum, vec3 (m2));
}
",
);

static BT709_EOTF: OpSnippet = OpSnippet::from_static(
    "bt709_eotf",
    "vec3 bt709_eotf (vec3 color)
{
  bvec3 is_low = lessThan (color, vec3 (0.08124));
  vec3 lo_part = color / 4.5;
  vec3 hi_part = pow ((color + 0.099) / 1.099, vec3 (1.0 / 0.45));
  return mix (hi_part, lo_part, is_low);
}
",
);

static BT709_INV_EOTF: OpSnippet = OpSnippet::from_static(
    "bt709_inv_eotf",
    "vec3 bt709_inv_eotf (vec3 color)
{
  bvec3 is_low = lessThan (color, vec3 (0.018));
  vec3 lo_part = 4.5 * color;
  vec3 hi_part = 1.099 * pow (color, vec3 (0.45)) - 0.099;
  return mix (hi_part, lo_part, is_low);
}
",
);

impl TransferFunction {
    fn eotf_op(self) -> Option<&'static OpSnippet> {
        match self {
            Self::Srgb => Some(&SRGB_EOTF),
            Self::Pq => Some(&PQ_EOTF),
            Self::Bt709 => Some(&BT709_EOTF),
            Self::Linear => None,
        }
    }

    fn inv_eotf_op(self) -> Option<&'static OpSnippet> {
        match self {
            Self::Srgb => Some(&SRGB_INV_EOTF),
            Self::Pq => Some(&PQ_INV_EOTF),
            Self::Bt709 => Some(&BT709_INV_EOTF),
            Self::Linear => None,
        }
    }

    /// Luminance of a linear value of 1.0, in nits.
    fn peak_luminance(self) -> f32 {
        match self {
            Self::Pq => PQ_MAX_LUMINANCE,
            _ => SDR_REFERENCE_WHITE,
        }
    }

    pub fn eotf(self, v: f32) -> f32 {
        match self {
            Self::Srgb => {
                let a = v.abs();
                let out = if a <= 0.04045 {
                    a / 12.92
                } else {
                    ((a + 0.055) / 1.055).powf(12.0 / 5.0)
                };
                out.copysign(v)
            }
            Self::Pq => {
                let c = v.clamp(0.0, 1.0);
                let p = c.powf(1.0 / 78.843_75);
                let num = (p - 0.835_937_5).max(0.0);
                let den = 18.851_562_5 - 18.6875 * p;
                (num / den).powf(1.0 / 0.159_301_76)
            }
            Self::Bt709 => {
                if v < 0.081_24 {
                    v / 4.5
                } else {
                    ((v + 0.099) / 1.099).powf(1.0 / 0.45)
                }
            }
            Self::Linear => v,
        }
    }

    pub fn inv_eotf(self, v: f32) -> f32 {
        match self {
            Self::Srgb => {
                let a = v.abs();
                let out = if a <= 0.003_130_8 {
                    a * 12.92
                } else {
                    a.powf(5.0 / 12.0) * 1.055 - 0.055
                };
                out.copysign(v)
            }
            Self::Pq => {
                let c = v.clamp(0.0, 1.0);
                let p = c.powf(0.159_301_76);
                ((0.835_937_5 + 18.851_562_5 * p) / (1.0 + 18.6875 * p)).powf(78.843_75)
            }
            Self::Bt709 => {
                if v < 0.018 {
                    4.5 * v
                } else {
                    1.099 * v.powf(0.45) - 0.099
                }
            }
            Self::Linear => v,
        }
    }
}

/// Color encoding of a surface or an output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ColorState {
    pub colorspace: Colorspace,
    pub transfer_function: TransferFunction,
}

impl ColorState {
    pub const SRGB: ColorState = ColorState {
        colorspace: Colorspace::Srgb,
        transfer_function: TransferFunction::Srgb,
    };

    pub const fn new(colorspace: Colorspace, transfer_function: TransferFunction) -> Self {
        Self {
            colorspace,
            transfer_function,
        }
    }

    fn mapping_matrix(&self, target: &ColorState) -> Option<&'static [[f32; 3]; 3]> {
        match (self.colorspace, target.colorspace) {
            (Colorspace::Srgb, Colorspace::Bt2020) => Some(&SRGB_TO_BT2020),
            (Colorspace::Bt2020, Colorspace::Srgb) => Some(&BT2020_TO_SRGB),
            _ => None,
        }
    }

    fn luminance_factor(&self, target: &ColorState) -> Option<f32> {
        let src = self.transfer_function.peak_luminance();
        let dst = target.transfer_function.peak_luminance();
        (src != dst).then_some(src / dst)
    }

    /// Fragment snippet converting premultiplied output from `self` into `target`.
    ///
    /// `None` when both states are equal. Colors are unpremultiplied around the transform and
    /// fully transparent fragments are left untouched.
    pub fn transform_snippet(&self, target: &ColorState) -> Option<Snippet> {
        if self == target {
            return None;
        }

        let eotf = self.transfer_function.eotf_op();
        let inv_eotf = target.transfer_function.inv_eotf_op();
        let luminance = self.luminance_factor(target).map(|factor| {
            OpSnippet::owned(
                "luminance_mapping",
                format!(
                    "vec3 luminance_mapping (vec3 color)\n{{\n  return color * {factor:.8};\n}}\n"
                ),
            )
        });
        let mapping = self.mapping_matrix(target).map(|m| {
            let row = |r: [f32; 3]| format!("vec3 ({:.7}, {:.7}, {:.7})", r[0], r[1], r[2]);
            OpSnippet::owned(
                "color_space_mapping",
                format!(
                    "vec3 color_space_mapping (vec3 color)\n{{\n  return vec3 (dot ({}, color),\n               dot ({}, color),\n               dot ({}, color));\n}}\n",
                    row(m[0]),
                    row(m[1]),
                    row(m[2])
                ),
            )
        });

        let ops: Vec<&OpSnippet> = [eotf, luminance.as_ref(), mapping.as_ref(), inv_eotf]
            .into_iter()
            .flatten()
            .collect();

        let mut declarations = String::new();
        for op in &ops {
            declarations.push_str(&op.source);
        }
        declarations.push_str("vec3 transform_color_state (vec3 color)\n{\n");
        for op in &ops {
            declarations.push_str(&format!("  color = {} (color);\n", op.name));
        }
        declarations.push_str("  return color;\n}\n");

        let post = "  if (cogl_color_out.a > 0.0)\n    {\n      vec3 rgb = cogl_color_out.rgb / cogl_color_out.a;\n      cogl_color_out.rgb = transform_color_state (rgb) * cogl_color_out.a;\n    }\n";
        Some(Snippet::new(SnippetHook::Fragment, declarations, post))
    }

    /// CPU evaluation of [`ColorState::transform_snippet`] for one straight-alpha color.
    pub fn transform_color(&self, target: &ColorState, rgb: [f32; 3]) -> [f32; 3] {
        if self == target {
            return rgb;
        }
        let mut c = rgb.map(|v| self.transfer_function.eotf(v));
        if let Some(factor) = self.luminance_factor(target) {
            c = c.map(|v| v * factor);
        }
        if let Some(m) = self.mapping_matrix(target) {
            c = [0, 1, 2].map(|i| m[i][0] * c[0] + m[i][1] * c[1] + m[i][2] * c[2]);
        }
        c.map(|v| target.transfer_function.inv_eotf(v))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/color/color_state.rs"]
mod tests;
