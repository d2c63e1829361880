//! The fixed root-zone snapshot baked into genesis.
//!
//! Each entry registers one reserved root name with its delegation
//! signer records and glue. The snapshot is data, not computation:
//! every byte of genesis derives from it.

use nomen_primitives::Writer;

/// A delegation signer record.
#[derive(Debug, Clone)]
pub struct DsRecord {
    pub key_tag: u16,
    pub algorithm: u8,
    pub digest_type: u8,
    pub digest: &'static str,
}

/// A glue address record.
#[derive(Debug, Clone)]
pub struct GlueRecord {
    /// Nameserver name.
    pub name: &'static str,
    /// Address family: 4 or 6.
    pub family: u8,
    /// Address bytes (4 or 16).
    pub address: &'static [u8],
}

/// One reserved root name with its resource data.
#[derive(Debug, Clone)]
pub struct ZoneEntry {
    /// Name without trailing dot.
    pub name: &'static str,
    /// Record time-to-live in seconds.
    pub ttl: u32,
    pub ds: &'static [DsRecord],
    pub glue: &'static [GlueRecord],
}

impl ZoneEntry {
    /// Canonical resource encoding committed in the REGISTER covenant:
    /// `ttl | ds-count | ds records | glue-count | glue records`.
    pub fn encode_resource(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.write_u32(self.ttl);

        w.write_varint(self.ds.len() as u64);
        for ds in self.ds {
            w.write_u16(ds.key_tag);
            w.write_u8(ds.algorithm);
            w.write_u8(ds.digest_type);
            let digest = hex::decode(ds.digest).unwrap_or_default();
            w.write_var_bytes(&digest);
        }

        w.write_varint(self.glue.len() as u64);
        for glue in self.glue {
            w.write_var_bytes(glue.name.as_bytes());
            // The family byte fixes the address width; no length prefix.
            w.write_u8(glue.family);
            w.write_bytes(glue.address);
        }

        w.into_vec()
    }
}

macro_rules! ds {
    ($tag:expr, $digest:expr) => {
        DsRecord {
            key_tag: $tag,
            algorithm: 8,
            digest_type: 2,
            digest: $digest,
        }
    };
}

/// The snapshot, sorted lexicographically by name.
pub const ROOT_ZONE: &[ZoneEntry] = &[
    ZoneEntry {
        name: "arpa",
        ttl: 86400,
        ds: &[ds!(
            42581,
            "a683c023f0112bb0bfcf9daa9905226cffe30f3b454069cf5c0266422fbc93e6"
        )],
        glue: &[GlueRecord {
            name: "a.root-servers.arpa",
            family: 4,
            address: &[199, 9, 14, 201],
        }],
    },
    ZoneEntry {
        name: "com",
        ttl: 172800,
        ds: &[ds!(
            30909,
            "520b8fea54485ed38b019e6b0810ad8799f119fb5065ad9c4e9e376013e1e366"
        )],
        glue: &[
            GlueRecord {
                name: "a.gtld-servers.com",
                family: 4,
                address: &[192, 5, 6, 30],
            },
            GlueRecord {
                name: "b.gtld-servers.com",
                family: 6,
                address: &[0x20, 0x01, 0x05, 0x03, 0x23, 0x1d, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x30],
            },
        ],
    },
    ZoneEntry {
        name: "de",
        ttl: 86400,
        ds: &[ds!(
            26755,
            "eb5b92e574e24109d450c566d97a667e7ee57a4ea230dab378480a52b2053991"
        )],
        glue: &[GlueRecord {
            name: "a.nic.de",
            family: 4,
            address: &[194, 0, 0, 53],
        }],
    },
    ZoneEntry {
        name: "edu",
        ttl: 172800,
        ds: &[ds!(
            28065,
            "0ec26d547c3004ae3fbc82bd0ca077e454849495d58b50b14d8c58a85268f66d"
        )],
        glue: &[GlueRecord {
            name: "a.edu-servers.edu",
            family: 4,
            address: &[192, 5, 6, 30],
        }],
    },
    ZoneEntry {
        name: "gov",
        ttl: 86400,
        ds: &[ds!(
            7698,
            "f8cf6dacfd4a22c32b6f4fecee82a2da86350723af6dccb5cbf0734ae2eb06be"
        )],
        glue: &[GlueRecord {
            name: "a.gov-servers.gov",
            family: 4,
            address: &[69, 36, 157, 30],
        }],
    },
    ZoneEntry {
        name: "int",
        ttl: 86400,
        ds: &[ds!(
            53696,
            "a7e67e095de751159c485bd0456ff071d732ce15fc7286e92bc9a1827149795f"
        )],
        glue: &[],
    },
    ZoneEntry {
        name: "jp",
        ttl: 86400,
        ds: &[ds!(
            35480,
            "90e5ae0d8200093d56ee264a327f5cd98cfe29effa77c5db80e9768a548fd2ce"
        )],
        glue: &[GlueRecord {
            name: "a.dns.jp",
            family: 4,
            address: &[203, 119, 1, 1],
        }],
    },
    ZoneEntry {
        name: "mil",
        ttl: 86400,
        ds: &[ds!(
            62292,
            "b4154a2520709fbb88e41a44c77b0edf39f67a3fd75e7a334de22d60a3baf0f5"
        )],
        glue: &[],
    },
    ZoneEntry {
        name: "net",
        ttl: 172800,
        ds: &[ds!(
            35886,
            "d7fb1294b705448d7f10a3c0de6afa83f4c23ad5c93cdbe390cc005e8a9efb27"
        )],
        glue: &[GlueRecord {
            name: "a.gtld-servers.net",
            family: 4,
            address: &[192, 5, 6, 30],
        }],
    },
    ZoneEntry {
        name: "org",
        ttl: 86400,
        ds: &[ds!(
            26974,
            "2feaf33721489dd689af352bf4c73244ad2b3339ae4eb71aaeb8d51338bc75e2"
        )],
        glue: &[GlueRecord {
            name: "a0.org.afilias-nst.org",
            family: 4,
            address: &[199, 19, 56, 1],
        }],
    },
    ZoneEntry {
        name: "uk",
        ttl: 86400,
        ds: &[ds!(
            43876,
            "f282aa5961a10c3168edbdd1e69c7c80d12f4f548827c0f39b92d04d78ce4298"
        )],
        glue: &[GlueRecord {
            name: "nsa.nic.uk",
            family: 4,
            address: &[156, 154, 100, 3],
        }],
    },
    ZoneEntry {
        name: "us",
        ttl: 86400,
        ds: &[ds!(
            21364,
            "bddb68431dbd97972e7be99359723e25c7c045029685e428acd77782946e8093"
        )],
        glue: &[GlueRecord {
            name: "a.cctld.us",
            family: 4,
            address: &[156, 154, 124, 65],
        }],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_sorted_and_unique() {
        for pair in ROOT_ZONE.windows(2) {
            assert!(pair[0].name < pair[1].name);
        }
    }

    #[test]
    fn test_resource_encoding_deterministic() {
        for entry in ROOT_ZONE {
            let a = entry.encode_resource();
            let b = entry.encode_resource();
            assert_eq!(a, b);
            assert!(!a.is_empty());
        }
    }

    #[test]
    fn test_digests_are_sha256_sized() {
        for entry in ROOT_ZONE {
            for ds in entry.ds {
                assert_eq!(hex::decode(ds.digest).unwrap().len(), 32, "{}", entry.name);
            }
        }
    }
}
