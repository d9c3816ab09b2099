//! Advertisement fixtures in `hcidump --raw` form.

/// Pebblebee: appearance, TX power 6, manufacturer data with button 0, RSSI -75.
/// Advertiser address 0C:0B:0A:09:08:07.
pub const PEBBLEBEE_LINE: &str = "> 04 3E 20 02 01 00 00 07 08 09 0A 0B 0C 14 02 01 06 03 19 \
                                  00 02 02 0A 06 09 FF 0E 00 01 02 03 04 00 55 B5";

/// UriBeacon for http://csr.com, TX power 20, RSSI -89, service list at index 14.
pub const URIBEACON_LINE: &str = "> 04 3E 1E 02 01 00 00 E3 E3 03 5B 02 00 12 03 03 D8 FE 0D \
                                  16 D8 FE 00 14 02 63 73 72 2E 63 6F 6D A7";

/// The same UriBeacon with a flags AD in front of the service list.
pub const URIBEACON_FLAGGED_LINE: &str = "> 04 3E 21 02 01 00 00 E3 E3 03 5B 02 00 15 02 01 1A \
                                          03 03 D8 FE 0D 16 D8 FE 00 14 02 63 73 72 2E 63 6F \
                                          6D A7";

/// RuuviTag Eddystone-URL `https://ruu.vi/#BEAXAMgA`, TX power -21, RSSI -61.
pub const RUUVITAG_LINE: &str = "> 04 3E 2A 02 01 00 00 11 22 33 44 55 66 1E 02 01 06 03 03 \
                                 AA FE 16 16 AA FE 10 EB 03 72 75 75 2E 76 69 2F 23 42 45 41 \
                                 58 41 4D 67 41 C3";
