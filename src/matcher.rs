use crate::models::Device;

/// Identity filters from a command request. Absent filters match every device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    pub id: Option<String>,
    pub address: Option<String>,
}

impl DeviceFilter {
    pub fn new(id: Option<String>, address: Option<String>) -> Self {
        Self { id, address }
    }

    pub fn matches(&self, device: &Device) -> bool {
        self.id.as_ref().is_none_or(|id| &device.id == id)
            && self.address.as_ref().is_none_or(|address| &device.address == address)
    }

    /// Matching devices in snapshot order.
    pub fn select<'a>(&self, devices: &'a [Device]) -> Vec<&'a Device> {
        devices.iter().filter(|d| self.matches(d)).collect()
    }
}
