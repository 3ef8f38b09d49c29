use pnet::util::MacAddr;

/// Maps a MAC address to the hardware vendor registered for its OUI.
pub trait VendorRepository: Send + Sync {
    fn get_vendor(&self, mac: MacAddr) -> Option<String>;
}
