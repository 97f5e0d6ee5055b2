use std::fmt;

use serde::Serialize;

use crate::error::CatalogError;

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize)]
pub struct DeviceDescriptor {
    pub id: String,
    pub display_name: String,
    pub default_wattage: u32,
}

impl DeviceDescriptor {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, default_wattage: u32) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            default_wattage,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum DeviceCategory {
    Entertainment,
    Kitchen,
    Climate,
    Laundry,
    Computing,
    Lighting,
    PersonalCare,
    WaterHeating,
    Other,
}

impl DeviceCategory {
    pub fn label(self) -> &'static str {
        match self {
            DeviceCategory::Entertainment => "Entertainment & Media",
            DeviceCategory::Kitchen => "Kitchen Appliances",
            DeviceCategory::Climate => "Climate Control",
            DeviceCategory::Laundry => "Laundry & Cleaning",
            DeviceCategory::Computing => "Computing & Office",
            DeviceCategory::Lighting => "Lighting",
            DeviceCategory::PersonalCare => "Personal Care",
            DeviceCategory::WaterHeating => "Water & Heating",
            DeviceCategory::Other => "Others",
        }
    }
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    category: DeviceCategory,
    descriptor: DeviceDescriptor,
}

/// Read-only device-type table. Built once and never mutated.
#[derive(Debug, Clone)]
pub struct DeviceCatalog {
    entries: Vec<CatalogEntry>,
}

impl DeviceCatalog {
    pub fn builtin() -> Self {
        Self::from_entries(BUILTIN_DEVICES.iter().map(|(category, id, name, wattage)| {
            (*category, DeviceDescriptor::new(*id, *name, *wattage))
        }))
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (DeviceCategory, DeviceDescriptor)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(category, descriptor)| CatalogEntry {
                    category,
                    descriptor,
                })
                .collect(),
        }
    }

    pub fn lookup(&self, id: &str) -> Result<&DeviceDescriptor, CatalogError> {
        self.entries
            .iter()
            .map(|entry| &entry.descriptor)
            .find(|descriptor| descriptor.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    pub fn all(&self) -> impl Iterator<Item = &DeviceDescriptor> {
        self.entries.iter().map(|entry| &entry.descriptor)
    }

    pub fn in_category(&self, category: DeviceCategory) -> impl Iterator<Item = &DeviceDescriptor> {
        self.entries
            .iter()
            .filter(move |entry| entry.category == category)
            .map(|entry| &entry.descriptor)
    }

    pub fn category_of(&self, id: &str) -> Option<DeviceCategory> {
        self.entries
            .iter()
            .find(|entry| entry.descriptor.id == id)
            .map(|entry| entry.category)
    }

    /// Case-insensitive substring match on display name or id. A blank query
    /// matches everything.
    pub fn search(&self, query: &str) -> Vec<&DeviceDescriptor> {
        let needle = query.trim().to_lowercase();
        self.all()
            .filter(|descriptor| {
                needle.is_empty()
                    || descriptor.display_name.to_lowercase().contains(&needle)
                    || descriptor.id.contains(&needle)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DeviceCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

const BUILTIN_DEVICES: &[(DeviceCategory, &str, &str, u32)] = &[
    (DeviceCategory::Entertainment, "tv", "TV - LED/LCD/Plasma", 100),
    (DeviceCategory::Entertainment, "gaming_console", "Gaming Console", 150),
    (DeviceCategory::Entertainment, "home_theater", "Home Theater System", 350),
    (DeviceCategory::Entertainment, "streaming_device", "Streaming Device", 5),
    (DeviceCategory::Kitchen, "refrigerator", "Refrigerator", 150),
    (DeviceCategory::Kitchen, "microwave", "Microwave", 1200),
    (DeviceCategory::Kitchen, "stove", "Electric Stove", 2000),
    (DeviceCategory::Kitchen, "dishwasher", "Dishwasher", 1800),
    (DeviceCategory::Kitchen, "coffee_maker", "Coffee Maker", 1000),
    (DeviceCategory::Kitchen, "toaster", "Toaster/Toaster Oven", 1200),
    (DeviceCategory::Kitchen, "blender", "Blender", 400),
    (DeviceCategory::Kitchen, "food_processor", "Food Processor", 500),
    (DeviceCategory::Climate, "ac", "Air Conditioner", 1500),
    (DeviceCategory::Climate, "fan", "Electric Fan", 75),
    (DeviceCategory::Climate, "heater", "Space Heater", 1500),
    (DeviceCategory::Climate, "dehumidifier", "Dehumidifier", 600),
    (DeviceCategory::Climate, "air_purifier", "Air Purifier", 50),
    (DeviceCategory::Laundry, "washing_machine", "Washing Machine", 500),
    (DeviceCategory::Laundry, "dryer", "Clothes Dryer", 3000),
    (DeviceCategory::Laundry, "vacuum", "Vacuum Cleaner", 1400),
    (DeviceCategory::Laundry, "iron", "Iron", 1000),
    (DeviceCategory::Computing, "desktop", "Desktop Computer", 200),
    (DeviceCategory::Computing, "laptop", "Laptop", 65),
    (DeviceCategory::Computing, "monitor", "Monitor", 30),
    (DeviceCategory::Computing, "printer", "Printer", 50),
    (DeviceCategory::Computing, "router", "Router/Modem", 15),
    (DeviceCategory::Lighting, "led_light", "LED Light", 10),
    (DeviceCategory::Lighting, "cfl_light", "CFL Light", 15),
    (DeviceCategory::Lighting, "incandescent", "Incandescent Light", 60),
    (DeviceCategory::Lighting, "smart_light", "Smart Light", 10),
    (DeviceCategory::PersonalCare, "hair_dryer", "Hair Dryer", 1800),
    (DeviceCategory::PersonalCare, "shaver", "Electric Shaver", 15),
    (DeviceCategory::PersonalCare, "toothbrush", "Electric Toothbrush", 5),
    (DeviceCategory::WaterHeating, "water_heater", "Water Heater", 3000),
    (DeviceCategory::WaterHeating, "water_pump", "Water Pump", 750),
    (DeviceCategory::WaterHeating, "kettle", "Electric Kettle", 1500),
    (DeviceCategory::Other, "security_camera", "Security Camera", 15),
    (DeviceCategory::Other, "doorbell", "Doorbell", 2),
    (DeviceCategory::Other, "ev_charger", "Electric Vehicle Charger", 7200),
    (DeviceCategory::Other, "smart_speaker", "Smart Speaker", 10),
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn builtin_catalog_has_unique_ids() {
        let catalog = DeviceCatalog::builtin();
        assert_eq!(catalog.len(), 40);
        let ids = catalog.all().map(|d| d.id.as_str()).collect::<HashSet<_>>();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn lookup_returns_descriptor() {
        let catalog = DeviceCatalog::builtin();
        let microwave = catalog.lookup("microwave").expect("microwave exists");
        assert_eq!(microwave.display_name, "Microwave");
        assert_eq!(microwave.default_wattage, 1200);
        assert_eq!(catalog.category_of("microwave"), Some(DeviceCategory::Kitchen));
    }

    #[test]
    fn lookup_reports_unknown_id() {
        let catalog = DeviceCatalog::builtin();
        assert_eq!(
            catalog.lookup("flux_capacitor"),
            Err(CatalogError::NotFound("flux_capacitor".to_string()))
        );
    }

    #[test]
    fn search_matches_name_or_id_ignoring_case() {
        let catalog = DeviceCatalog::builtin();
        let lights = catalog
            .search("LIGHT")
            .into_iter()
            .map(|d| d.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            lights,
            vec!["led_light", "cfl_light", "incandescent", "smart_light"]
        );
        assert_eq!(catalog.search("ev_charger").len(), 1);
        assert_eq!(catalog.search("   ").len(), catalog.len());
        assert!(catalog.search("teleporter").is_empty());
    }

    #[test]
    fn category_filter_keeps_catalog_order() {
        let catalog = DeviceCatalog::builtin();
        let water = catalog
            .in_category(DeviceCategory::WaterHeating)
            .map(|d| d.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(water, vec!["water_heater", "water_pump", "kettle"]);
    }
}
