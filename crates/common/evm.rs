use crate::utils::keccak;
use ethereum_types::Address;
use rlp::RlpStream;

/// Calculates the address of a new contract created by `sender` using the
/// `CREATE` scheme: the last 20 bytes of `keccak256(rlp([sender, nonce]))`.
///
/// `nonce` is the sender's nonce *before* it is incremented for the creation.
pub fn calculate_create_address(sender: Address, nonce: u64) -> Address {
    let mut stream = RlpStream::new_list(2);
    stream.append(&sender);
    stream.append(&nonce);
    Address::from(keccak(stream.out()))
}
