use crate::geometry::{FloatType, WorldVector};

/// Surface description consumed by the evaluator.
///
/// The emission color starts out equal to the surface color and the
/// absorption color is its complement; both can be overridden afterwards.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    pub color: WorldVector,
    pub roughness: FloatType,

    pub emission_color: WorldVector,
    pub emission_strength: FloatType,

    pub absorb_color: WorldVector,
    pub absorption_strength: FloatType,

    pub emission_scattering_index: FloatType,
    pub refractive_index: FloatType,
    pub reflective_index: FloatType,
}

impl Material {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        color: WorldVector,
        roughness: FloatType,
        emission_strength: FloatType,
        emission_scattering_index: FloatType,
        absorption_strength: FloatType,
        refractive_index: FloatType,
        reflective_index: FloatType,
    ) -> Material {
        Material {
            color,
            roughness,
            emission_color: color,
            emission_strength,
            absorb_color: WorldVector::new(1.0 - color.x, 1.0 - color.y, 1.0 - color.z),
            absorption_strength,
            emission_scattering_index,
            refractive_index,
            reflective_index,
        }
    }
}

impl Default for Material {
    fn default() -> Material {
        Material {
            color: WorldVector::zeros(),
            roughness: 0.0,
            emission_color: WorldVector::zeros(),
            emission_strength: 0.0,
            absorb_color: WorldVector::zeros(),
            absorption_strength: 0.0,
            emission_scattering_index: 0.0,
            refractive_index: 0.0,
            reflective_index: 0.0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::assert;

    #[test]
    fn new_derives_emission_and_absorption_colors() {
        let m = Material::new(WorldVector::new(0.9, 0.5, 0.1), 0.8, 0.0, 0.5, 1.0, 1.5, 1.0);
        assert!(m.emission_color == m.color);
        assert!((m.absorb_color.x - 0.1).abs() < 1e-6);
        assert!((m.absorb_color.y - 0.5).abs() < 1e-6);
        assert!((m.absorb_color.z - 0.9).abs() < 1e-6);
    }
}
