//! Built-in engineering concept table used by `ConceptRegistry::standard`.
//!
//! Order matters: for an overloaded symbol the first concept listed is the
//! default when the context does not favour another one.

use super::registry::ConceptEntry;

struct ConceptRow {
    id: &'static str,
    name: &'static str,
    symbols: &'static [&'static str],
    unit: &'static str,
    tags: &'static [&'static str],
    keywords: &'static [&'static str],
    aliases: &'static [&'static str],
}

const fn row(
    id: &'static str,
    name: &'static str,
    symbols: &'static [&'static str],
    unit: &'static str,
    tags: &'static [&'static str],
    keywords: &'static [&'static str],
    aliases: &'static [&'static str],
) -> ConceptRow {
    ConceptRow { id, name, symbols, unit, tags, keywords, aliases }
}

static STANDARD_CONCEPTS: &[ConceptRow] = &[
    // Heat transfer
    row(
        "thermal_conductivity", "thermal conductivity", &["k", "λ"], "W/m·K",
        &["thermal", "material_property", "transport", "thermophysical"],
        &["conduct", "fourier", "heat flux", "insulation", "wall"],
        &["conductivity"],
    ),
    row(
        "heat_transfer_coefficient", "heat transfer coefficient", &["h", "h_c"], "W/m²·K",
        &["thermal", "convection", "transport"],
        &["convect", "newton", "cooling", "film", "fluid"],
        &["convection coefficient", "film coefficient", "convective coefficient"],
    ),
    row(
        "thermal_diffusivity", "thermal diffusivity", &["α", "a"], "m²/s",
        &["thermal", "transport", "diffusivity", "material_property", "thermophysical"],
        &["diffus", "transient", "fourier number", "conduction"],
        &["diffusivity"],
    ),
    row(
        "absorptivity", "absorptivity", &["α", "α_s"], "-",
        &["radiation", "surface_property", "material_property"],
        &["absorb", "irradiation", "solar", "radiation"],
        &["absorptance", "solar absorptivity"],
    ),
    row(
        "emissivity", "emissivity", &["ε"], "-",
        &["radiation", "surface_property", "material_property"],
        &["radiat", "emi", "blackbody", "gray", "surface"],
        &["emittance", "total emissivity"],
    ),
    row(
        "stefan_boltzmann_constant", "stefan boltzmann constant", &["σ"], "W/m²·K⁴",
        &["radiation", "constant"],
        &["radiat", "stefan", "blackbody", "emi", "t^4", "t⁴"],
        &[],
    ),
    row(
        "specific_heat", "specific heat", &["c_p", "cp", "c"], "J/kg·K",
        &["thermal", "material_property", "thermophysical", "thermodynamics"],
        &["heat capacity", "energy storage", "enthalpy"],
        &["specific heat capacity", "heat capacity", "specific heat at constant pressure"],
    ),
    row(
        "temperature", "temperature", &["T", "T_s", "T_∞", "T_inf", "θ"], "K",
        &["thermal", "state"],
        &["temperature", "heat"],
        &["temp"],
    ),
    row(
        "heat_flux", "heat flux", &["q''", "q\""], "W/m²",
        &["thermal", "flux", "energy_transfer"],
        &["flux", "per unit area", "fourier"],
        &["heat flux density"],
    ),
    row(
        "heat_rate", "heat transfer rate", &["q", "Q"], "W",
        &["thermal", "energy_transfer"],
        &["rate", "total", "power"],
        &["heat rate", "heat flow", "heat transfer"],
    ),
    row(
        "thermal_resistance", "thermal resistance", &["R", "R_t"], "K/W",
        &["thermal", "resistance"],
        &["resist", "circuit", "series", "contact"],
        &[],
    ),
    // Fluids
    row(
        "density", "density", &["ρ"], "kg/m³",
        &["material_property", "fluid_property", "thermophysical"],
        &["mass", "buoyan", "fluid"],
        &["mass density"],
    ),
    row(
        "dynamic_viscosity", "dynamic viscosity", &["μ"], "Pa·s",
        &["fluid_property", "transport", "thermophysical"],
        &["viscous", "shear", "fluid", "flow"],
        &["viscosity", "absolute viscosity"],
    ),
    row(
        "kinematic_viscosity", "kinematic viscosity", &["ν"], "m²/s",
        &["fluid_property", "transport", "diffusivity", "thermophysical"],
        &["reynolds", "momentum", "flow"],
        &["momentum diffusivity"],
    ),
    row(
        "velocity", "velocity", &["V", "u", "v", "U"], "m/s",
        &["kinematics", "flow"],
        &["speed", "flow", "stream"],
        &["speed", "flow velocity", "free stream velocity"],
    ),
    row(
        "volume", "volume", &["V"], "m³",
        &["geometry"],
        &["volume", "tank", "vessel"],
        &[],
    ),
    row(
        "pressure", "pressure", &["p", "P"], "Pa",
        &["fluid_property", "state", "mechanical"],
        &["pressure", "head", "gauge"],
        &["absolute pressure"],
    ),
    row(
        "gas_constant", "gas constant", &["R"], "J/kg·K",
        &["thermodynamics", "constant", "fluid_property"],
        &["gas", "ideal", "pv"],
        &["specific gas constant"],
    ),
    row(
        "gravitational_acceleration", "gravitational acceleration", &["g"], "m/s²",
        &["constant", "kinematics"],
        &["gravity", "buoyan", "weight", "head"],
        &["gravity"],
    ),
    row(
        "reynolds_number", "reynolds number", &["Re", "Re_D", "Re_x"], "-",
        &["dimensionless_group", "flow", "convection"],
        &[], &["reynolds"],
    ),
    row(
        "prandtl_number", "prandtl number", &["Pr"], "-",
        &["dimensionless_group", "fluid_property", "convection", "thermophysical"],
        &[], &["prandtl"],
    ),
    row(
        "nusselt_number", "nusselt number", &["Nu", "Nu_D", "Nu_x"], "-",
        &["dimensionless_group", "convection"],
        &[], &["nusselt"],
    ),
    // Solid mechanics
    row(
        "strain", "strain", &["ε"], "-",
        &["mechanical", "deformation"],
        &["strain", "stress", "elongation", "modulus", "deform", "load"],
        &["normal strain"],
    ),
    row(
        "stress", "stress", &["σ", "τ"], "Pa",
        &["mechanical", "load"],
        &["stress", "strain", "load", "force", "modulus", "yield"],
        &["normal stress", "shear stress"],
    ),
    row(
        "youngs_modulus", "young's modulus", &["E"], "Pa",
        &["mechanical", "material_property"],
        &["elastic", "modulus", "stiffness", "hooke", "strain"],
        &["elastic modulus", "modulus of elasticity", "youngs modulus"],
    ),
    row(
        "energy", "energy", &["E", "U"], "J",
        &["thermodynamics", "energy"],
        &["energy", "work", "internal"],
        &["internal energy"],
    ),
    row(
        "spring_constant", "spring constant", &["k", "k_s"], "N/m",
        &["mechanical"],
        &["spring", "stiffness", "hooke", "displacement", "oscillat"],
        &["stiffness"],
    ),
    row(
        "boltzmann_constant", "boltzmann constant", &["k", "k_B"], "J/K",
        &["constant", "statistical"],
        &["boltzmann", "molecul", "entropy", "kinetic"],
        &[],
    ),
    row(
        "mass", "mass", &["m"], "kg",
        &["mechanical"],
        &["mass", "weight", "inertia"],
        &[],
    ),
    // Geometry and time
    row(
        "length", "length", &["L", "x", "y", "z", "s"], "m",
        &["geometry", "length"],
        &["length", "distance", "position", "wall"],
        &["distance", "position", "characteristic length"],
    ),
    row(
        "diameter", "diameter", &["D", "d", "D_h"], "m",
        &["geometry", "length"],
        &["diameter", "pipe", "tube", "sphere", "cylinder"],
        &["hydraulic diameter", "outer diameter", "inner diameter"],
    ),
    row(
        "radius", "radius", &["r", "r_o", "r_i"], "m",
        &["geometry", "length"],
        &["radius", "radial", "cylinder", "sphere"],
        &["outer radius", "inner radius"],
    ),
    row(
        "thickness", "thickness", &["δ", "b"], "m",
        &["geometry", "length"],
        &["thickness", "layer", "wall", "plate"],
        &["wall thickness"],
    ),
    row(
        "height", "height", &["h", "H", "z"], "m",
        &["geometry", "length"],
        &["height", "elevation", "level"],
        &["elevation"],
    ),
    row(
        "area", "area", &["A", "A_s", "A_c"], "m²",
        &["geometry"],
        &["area", "surface", "cross section"],
        &["surface area", "cross-sectional area"],
    ),
    row(
        "time", "time", &["t"], "s",
        &["time"],
        &["time", "transient", "duration"],
        &["duration", "elapsed time"],
    ),
];

/// The built-in concept entries, in registration order.
pub(crate) fn standard_concepts() -> Vec<ConceptEntry> {
    STANDARD_CONCEPTS
        .iter()
        .filter_map(|row| {
            match ConceptEntry::from_units(row.id, row.name, row.symbols, row.unit, row.tags) {
                Ok(entry) => Some(entry.with_keywords(row.keywords).with_aliases(row.aliases)),
                Err(e) => {
                    tracing::error!(concept = row.id, error = %e, "Built-in concept has an unparsable unit");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_row_has_a_parsable_unit() {
        assert_eq!(standard_concepts().len(), STANDARD_CONCEPTS.len());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ids: Vec<_> = STANDARD_CONCEPTS.iter().map(|r| r.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), STANDARD_CONCEPTS.len());
    }
}
