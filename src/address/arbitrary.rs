//! `proptest::Arbitrary` impls for [`PeerAddress`] and its component types.
//!
//! Kept separate from the main module, the way `meta_addr.rs` keeps its own
//! `Arbitrary` impl in a submodule: these types don't derive cleanly
//! (`SocketAddr`, and the seed/non-seed invariant on `PeerAddress`), so the
//! strategies are written out by hand.

use proptest::prelude::*;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use super::{IdentityKey, PeerAddress, SignalId};
use crate::protocol::{Protocol, Services};

impl Arbitrary for IdentityKey {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: ()) -> Self::Strategy {
        any::<[u8; 32]>().prop_map(IdentityKey).boxed()
    }
}

impl Arbitrary for SignalId {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: ()) -> Self::Strategy {
        any::<IdentityKey>().prop_map(SignalId).boxed()
    }
}

fn arbitrary_net_address() -> impl Strategy<Value = Option<SocketAddr>> {
    prop_oneof![
        Just(None),
        any::<(u8, u8, u8, u8, u16)>().prop_map(|(a, b, c, d, port)| Some(SocketAddr::new(
            IpAddr::V4(Ipv4Addr::new(a, b, c, d)),
            port
        ))),
    ]
}

impl Arbitrary for PeerAddress {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: ()) -> Self::Strategy {
        (
            any::<Protocol>(),
            any::<IdentityKey>(),
            arbitrary_net_address(),
            any::<u64>(),
            any::<u64>().prop_map(Services::from_bits_truncate),
            any::<bool>(),
        )
            .prop_flat_map(|(protocol, identity, net_address, timestamp, services, is_seed)| {
                if is_seed {
                    Just(PeerAddress::new_seed(protocol, identity, net_address, services)).boxed()
                } else if protocol == Protocol::Rtc {
                    (any::<SignalId>(), any::<u8>())
                        .prop_map(move |(signal_id, distance)| {
                            PeerAddress::new_rtc(
                                identity,
                                signal_id,
                                distance,
                                net_address,
                                timestamp,
                                services,
                            )
                        })
                        .boxed()
                } else {
                    Just(PeerAddress::new_gossiped(
                        protocol,
                        identity,
                        net_address,
                        timestamp,
                        services,
                    ))
                    .boxed()
                }
            })
            .boxed()
    }
}
