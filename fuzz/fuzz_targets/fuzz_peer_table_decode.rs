//! Peer-table decoding over arbitrary bytes must fail cleanly.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(peers) = obscura_net::wire::decode_peers(data) {
        // A decoded table must re-encode to something decodable.
        let encoded = obscura_net::wire::encode_peers(&peers);
        assert_eq!(obscura_net::wire::decode_peers(&encoded).unwrap(), peers);
    }
});
