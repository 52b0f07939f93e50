use std::fmt::{Display, Formatter};

/// Static description of the driver and the hardware it is meant for.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ButtonInfo {
    pub chip_name: &'static str,
    pub manufacturer_name: &'static str,
    pub interface: &'static str,
    pub supply_voltage_min_v: f32,
    pub supply_voltage_max_v: f32,
    pub max_current_ma: f32,
    pub temperature_min: f32,
    pub temperature_max: f32,
    /// Major version times 1000, plus minor version times 100.
    pub driver_version: u32,
}

impl ButtonInfo {
    pub fn version_major(&self) -> u32 {
        self.driver_version / 1000
    }

    pub fn version_minor(&self) -> u32 {
        (self.driver_version % 1000) / 100
    }
}

impl Display for ButtonInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} by {} over {}, driver v{}.{}",
            self.chip_name,
            self.manufacturer_name,
            self.interface,
            self.version_major(),
            self.version_minor(),
        )
    }
}

/// Gets the driver's capability descriptor. Needs no handle.
pub const fn info() -> ButtonInfo {
    ButtonInfo {
        chip_name: "General MULTI_BUTTON",
        manufacturer_name: "General",
        interface: "GPIO",
        supply_voltage_min_v: 1.8,
        supply_voltage_max_v: 5.5,
        max_current_ma: 1.0,
        temperature_min: -40.0,
        temperature_max: 125.0,
        driver_version: 1000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_splits_into_major_and_minor() {
        let info = info();
        assert_eq!((info.version_major(), info.version_minor()), (1, 0));
        assert_eq!(info.to_string(), "General MULTI_BUTTON by General over GPIO, driver v1.0");
    }
}
