use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Physical parameters of one sweep
///
/// Temperature is in units of J/k_B. Values are validated on construction and
/// on every change, so a `SimulationParameters` in hand is always usable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationParameters {
    temperature: f64,
    field: f64,
    coupling: f64,
}

impl SimulationParameters {
    pub fn new(temperature: f64, field: f64, coupling: f64) -> Result<Self> {
        validate_temperature(temperature)?;
        validate_field(field)?;
        validate_coupling(coupling)?;
        Ok(Self {
            temperature,
            field,
            coupling,
        })
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn field(&self) -> f64 {
        self.field
    }

    pub fn coupling(&self) -> f64 {
        self.coupling
    }

    pub fn get(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::Temperature => self.temperature,
            Parameter::Field => self.field,
            Parameter::Coupling => self.coupling,
        }
    }

    /// Copy with one parameter replaced, validated first.
    pub fn with(self, parameter: Parameter, value: f64) -> Result<Self> {
        let mut next = self;
        match parameter {
            Parameter::Temperature => {
                validate_temperature(value)?;
                next.temperature = value;
            }
            Parameter::Field => {
                validate_field(value)?;
                next.field = value;
            }
            Parameter::Coupling => {
                validate_coupling(value)?;
                next.coupling = value;
            }
        }
        Ok(next)
    }
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            temperature: 2.0,
            field: 0.0,
            coupling: 1.0,
        }
    }
}

/// Name of a runtime-adjustable parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Temperature,
    Field,
    Coupling,
}

impl FromStr for Parameter {
    type Err = SimError;

    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "temperature" | "t" => Ok(Parameter::Temperature),
            "field" | "h" | "magnetic_field" => Ok(Parameter::Field),
            "coupling" | "j" => Ok(Parameter::Coupling),
            _ => Err(SimError::UnknownParameter(name.to_string())),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Parameter::Temperature => "temperature",
            Parameter::Field => "field",
            Parameter::Coupling => "coupling",
        };
        f.write_str(name)
    }
}

fn validate_temperature(temperature: f64) -> Result<()> {
    if !temperature.is_finite() || temperature <= 0.0 {
        return Err(SimError::InvalidTemperature(temperature));
    }
    Ok(())
}

fn validate_field(field: f64) -> Result<()> {
    if !field.is_finite() {
        return Err(SimError::InvalidField(field));
    }
    Ok(())
}

fn validate_coupling(coupling: f64) -> Result<()> {
    if !coupling.is_finite() || coupling == 0.0 {
        return Err(SimError::InvalidCoupling(coupling));
    }
    Ok(())
}
