use std::sync::Arc;

use bytes::Bytes;
use ledgervm::{
    TxResult, VMConfig, VMError, constants::MAX_CODE_SIZE, db::StateView, errors::ExecutionFault,
};
use ledgervm_common::{Address, H256, U256, evm::calculate_create_address, tracing::CallType};
use ledgervm_test::{
    ALL_GAS, FRONTIER_BLOCK, HOMESTEAD_BLOCK, Op, SPURIOUS_DRAGON_BLOCK, Script,
    ScriptedInterpreter, TestDatabase, new_vm,
};
use tokio_util::sync::CancellationToken;

const GAS: u64 = 1_000_000;

fn deployer() -> Address {
    Address::from_low_u64_be(0xde9)
}

fn slot(key: u64) -> H256 {
    H256::from_low_u64_be(key)
}

fn returning(code: &'static [u8]) -> Bytes {
    Script::new()
        .op(Op::Return(Bytes::from_static(code)))
        .build()
}

// ==================== Successful creation ====================

#[test]
fn test_create_derives_address_from_sender_nonce() {
    let mut db = TestDatabase::new().with_balance(deployer(), 1_000).into_db();
    let mut vm = new_vm(
        &mut db,
        SPURIOUS_DRAGON_BLOCK,
        VMConfig::default(),
        Arc::new(ScriptedInterpreter::new()),
    );

    let created = vm
        .create(deployer(), returning(b"\x60\x00\x60\x00"), GAS, U256::zero())
        .unwrap();
    let expected = calculate_create_address(deployer(), 0);
    assert!(created.is_success());
    assert_eq!(created.address, Some(expected));
    assert_eq!(created.deposit_error, None);

    drop(vm);
    assert_eq!(db.get_nonce(deployer()).unwrap(), 1);
    assert_eq!(db.get_nonce(expected).unwrap(), 1);
    assert_eq!(
        db.get_code(expected).unwrap(),
        Bytes::from_static(b"\x60\x00\x60\x00")
    );
}

#[test]
fn test_created_account_nonce_is_zero_before_spurious_dragon() {
    let mut db = TestDatabase::new().with_balance(deployer(), 1_000).into_db();
    let mut vm = new_vm(
        &mut db,
        HOMESTEAD_BLOCK,
        VMConfig::default(),
        Arc::new(ScriptedInterpreter::new()),
    );

    let created = vm
        .create(deployer(), returning(b"\x00"), GAS, U256::zero())
        .unwrap();
    let address = created.address.unwrap();

    drop(vm);
    assert!(db.account_exists(address).unwrap());
    assert_eq!(db.get_nonce(address).unwrap(), 0);
    assert_eq!(db.get_nonce(deployer()).unwrap(), 1);
}

#[test]
fn test_create_charges_per_deposited_byte_and_clears_output() {
    let code = [0x5bu8; 64];
    let init_code = Script::new()
        .op(Op::Return(Bytes::copy_from_slice(&code)))
        .build();
    let mut db = TestDatabase::new().with_balance(deployer(), 1_000).into_db();
    let mut vm = new_vm(
        &mut db,
        SPURIOUS_DRAGON_BLOCK,
        VMConfig::default(),
        Arc::new(ScriptedInterpreter::new()),
    );

    let created = vm.create(deployer(), init_code, GAS, U256::from(400)).unwrap();
    assert_eq!(created.context.result, TxResult::Success);
    assert_eq!(created.context.gas_used, 64 * 200);
    assert_eq!(created.gas_left(), GAS - 64 * 200);
    assert!(created.context.output.is_empty());

    let address = created.address.unwrap();
    drop(vm);
    assert_eq!(db.get_balance(address).unwrap(), U256::from(400));
    assert_eq!(db.get_balance(deployer()).unwrap(), U256::from(600));
    assert_eq!(db.get_code(address).unwrap().len(), 64);
}

#[test]
fn test_sequential_creates_use_distinct_addresses() {
    let mut db = TestDatabase::new().with_balance(deployer(), 1_000).into_db();
    let mut vm = new_vm(
        &mut db,
        SPURIOUS_DRAGON_BLOCK,
        VMConfig::default(),
        Arc::new(ScriptedInterpreter::new()),
    );

    let first = vm
        .create(deployer(), returning(b"\x01"), GAS, U256::zero())
        .unwrap();
    let second = vm
        .create(deployer(), returning(b"\x02"), GAS, U256::zero())
        .unwrap();

    assert_eq!(first.address, Some(calculate_create_address(deployer(), 0)));
    assert_eq!(second.address, Some(calculate_create_address(deployer(), 1)));
    assert_ne!(first.address, second.address);

    drop(vm);
    assert_eq!(db.get_nonce(deployer()).unwrap(), 2);
}

#[test]
fn test_init_code_storage_lands_in_new_account() {
    let init_code = Script::new()
        .sstore(1, 11)
        .op(Op::RecordFrame)
        .op(Op::Return(Bytes::from_static(b"\xaa")))
        .build();
    let interpreter = Arc::new(ScriptedInterpreter::new());
    let mut db = TestDatabase::new().with_balance(deployer(), 1_000).into_db();
    let mut vm = new_vm(
        &mut db,
        SPURIOUS_DRAGON_BLOCK,
        VMConfig::default(),
        interpreter.clone(),
    );

    let created = vm
        .create(deployer(), init_code, GAS, U256::zero())
        .unwrap();
    let address = created.address.unwrap();

    let frames = interpreter.frames();
    assert_eq!(frames[0].to, address);
    assert_eq!(frames[0].msg_sender, deployer());
    assert_eq!(frames[0].call_type, CallType::CREATE);

    drop(vm);
    assert_eq!(db.get_storage(address, slot(1)).unwrap(), U256::from(11));
}

// ==================== Rejected creation ====================

#[test]
fn test_create_with_insufficient_balance_keeps_nonce() {
    let mut db = TestDatabase::new().with_balance(deployer(), 10).into_db();
    let mut vm = new_vm(
        &mut db,
        SPURIOUS_DRAGON_BLOCK,
        VMConfig::default(),
        Arc::new(ScriptedInterpreter::new()),
    );

    let created = vm
        .create(deployer(), returning(b"\x01"), GAS, U256::from(11))
        .unwrap();
    assert_eq!(created.address, None);
    assert_eq!(
        created.context.result,
        TxResult::Revert(VMError::InsufficientBalance(None))
    );
    assert_eq!(created.gas_left(), GAS);

    drop(vm);
    assert_eq!(db.get_nonce(deployer()).unwrap(), 0);
    assert!(
        !db.account_exists(calculate_create_address(deployer(), 0))
            .unwrap()
    );
}

// ==================== Code deposit ====================

#[test]
fn test_oversized_code_fails_at_every_fork() {
    for block in [FRONTIER_BLOCK, HOMESTEAD_BLOCK, SPURIOUS_DRAGON_BLOCK] {
        let mut db = TestDatabase::new().with_balance(deployer(), 1_000).into_db();
        let mut vm = new_vm(
            &mut db,
            block,
            VMConfig::default(),
            Arc::new(ScriptedInterpreter::new()),
        );

        let init_code = Script::new()
            .sstore(1, 1)
            .op(Op::ReturnZeros(u32::try_from(MAX_CODE_SIZE + 1).unwrap()))
            .build();
        let created = vm
            .create(deployer(), init_code, 10_000_000, U256::from(5))
            .unwrap();
        let address = calculate_create_address(deployer(), 0);
        assert_eq!(
            created.context.result,
            TxResult::Revert(VMError::CodeSizeExceeded),
            "block {block}"
        );
        assert_eq!(created.address, Some(address));
        assert_eq!(created.gas_left(), 0);

        drop(vm);
        assert!(!db.account_exists(address).unwrap());
        assert_eq!(db.get_nonce(deployer()).unwrap(), 1);
        assert_eq!(db.get_balance(deployer()).unwrap(), U256::from(1_000));
    }
}

#[test]
fn test_code_at_size_limit_is_accepted() {
    let mut db = TestDatabase::new().with_balance(deployer(), 1_000).into_db();
    let mut vm = new_vm(
        &mut db,
        SPURIOUS_DRAGON_BLOCK,
        VMConfig::default(),
        Arc::new(ScriptedInterpreter::new()),
    );

    let init_code = Script::new()
        .op(Op::ReturnZeros(u32::try_from(MAX_CODE_SIZE).unwrap()))
        .build();
    let created = vm
        .create(deployer(), init_code, 5_000_000, U256::zero())
        .unwrap();
    assert_eq!(created.context.result, TxResult::Success);
    assert_eq!(created.context.gas_used, 24_576 * 200);

    let address = created.address.unwrap();
    drop(vm);
    assert_eq!(db.get_code(address).unwrap().len(), MAX_CODE_SIZE);
}

#[test]
fn test_code_store_out_of_gas_reverts_since_homestead() {
    let init_code = Script::new()
        .sstore(1, 1)
        .op(Op::ReturnZeros(100))
        .build();
    let mut db = TestDatabase::new().with_balance(deployer(), 1_000).into_db();
    let mut vm = new_vm(
        &mut db,
        HOMESTEAD_BLOCK,
        VMConfig::default(),
        Arc::new(ScriptedInterpreter::new()),
    );

    // Depositing 100 bytes costs 20_000 gas.
    let created = vm
        .create(deployer(), init_code, 10_000, U256::from(7))
        .unwrap();
    let address = calculate_create_address(deployer(), 0);
    assert_eq!(
        created.context.result,
        TxResult::Revert(VMError::CodeStoreOutOfGas)
    );
    assert_eq!(created.address, Some(address));
    assert_eq!(created.gas_left(), 0);
    assert_eq!(created.deposit_error, None);

    drop(vm);
    assert!(!db.account_exists(address).unwrap());
    assert_eq!(db.get_balance(deployer()).unwrap(), U256::from(1_000));
}

#[test]
fn test_code_store_out_of_gas_keeps_account_before_homestead() {
    let init_code = Script::new()
        .sstore(1, 1)
        .op(Op::ReturnZeros(100))
        .build();
    let mut db = TestDatabase::new().with_balance(deployer(), 1_000).into_db();
    let mut vm = new_vm(
        &mut db,
        FRONTIER_BLOCK,
        VMConfig::default(),
        Arc::new(ScriptedInterpreter::new()),
    );

    let created = vm
        .create(deployer(), init_code, 10_000, U256::from(7))
        .unwrap();
    let address = calculate_create_address(deployer(), 0);
    assert_eq!(created.context.result, TxResult::Success);
    assert!(created.is_success());
    assert_eq!(created.address, Some(address));
    assert_eq!(created.deposit_error, Some(VMError::CodeStoreOutOfGas));
    assert_eq!(created.error(), Some(&VMError::CodeStoreOutOfGas));
    assert_eq!(created.gas_left(), 10_000);

    drop(vm);
    assert!(db.account_exists(address).unwrap());
    assert!(db.get_code(address).unwrap().is_empty());
    assert_eq!(db.get_storage(address, slot(1)).unwrap(), U256::from(1));
    assert_eq!(db.get_balance(address).unwrap(), U256::from(7));
}

#[test]
fn test_reverting_init_code_undoes_creation() {
    let init_code = Script::new().sstore(1, 1).op(Op::Revert).build();
    let mut db = TestDatabase::new().with_balance(deployer(), 1_000).into_db();
    let mut vm = new_vm(
        &mut db,
        SPURIOUS_DRAGON_BLOCK,
        VMConfig::default(),
        Arc::new(ScriptedInterpreter::new()),
    );

    let created = vm
        .create(deployer(), init_code, GAS, U256::from(50))
        .unwrap();
    let address = calculate_create_address(deployer(), 0);
    assert_eq!(
        created.context.result,
        TxResult::Revert(VMError::ExecutionFault(ExecutionFault::Revert))
    );
    assert_eq!(created.address, Some(address));
    assert_eq!(created.gas_left(), 0);

    drop(vm);
    assert!(!db.account_exists(address).unwrap());
    assert_eq!(db.get_balance(deployer()).unwrap(), U256::from(1_000));
    assert_eq!(db.get_nonce(deployer()).unwrap(), 1);
}

// ==================== Nested creation ====================

#[test]
fn test_contract_can_create_contracts() {
    let factory = Address::from_low_u64_be(0xfac);
    let child_init = returning(b"\xc0\xde");
    let factory_code = Script::new()
        .op(Op::Create {
            gas: ALL_GAS,
            value: U256::zero(),
            init_code: child_init,
        })
        .build();
    let interpreter = Arc::new(ScriptedInterpreter::new());
    let mut db = TestDatabase::new()
        .with_balance(deployer(), 1_000)
        .with_code(factory, factory_code)
        .into_db();
    let mut vm = new_vm(
        &mut db,
        SPURIOUS_DRAGON_BLOCK,
        VMConfig::default(),
        interpreter.clone(),
    );

    let result = vm
        .call(deployer(), factory, Bytes::new(), GAS, U256::zero())
        .unwrap();
    assert_eq!(result.result, TxResult::Success);

    let expected = calculate_create_address(factory, 0);
    let calls = interpreter.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].call_type, CallType::CREATE);
    assert_eq!(calls[0].address, Some(expected));
    assert_eq!(calls[0].depth, 0);
    assert_eq!(calls[0].result, TxResult::Success);
    assert_eq!(result.gas_used, 2 * 200);

    drop(vm);
    assert_eq!(db.get_nonce(factory).unwrap(), 1);
    assert_eq!(
        db.get_code(expected).unwrap(),
        Bytes::from_static(b"\xc0\xde")
    );
}

#[test]
fn test_nested_create_is_a_noop_without_recursion() {
    let factory = Address::from_low_u64_be(0xfac);
    let factory_code = Script::new()
        .op(Op::Create {
            gas: ALL_GAS,
            value: U256::zero(),
            init_code: returning(b"\xc0\xde"),
        })
        .sstore(1, 1)
        .build();
    let interpreter = Arc::new(ScriptedInterpreter::new());
    let mut db = TestDatabase::new().with_code(factory, factory_code).into_db();
    let mut vm = new_vm(
        &mut db,
        SPURIOUS_DRAGON_BLOCK,
        VMConfig::default().with_no_recursion(true),
        interpreter.clone(),
    );

    let result = vm
        .call(deployer(), factory, Bytes::new(), GAS, U256::zero())
        .unwrap();
    assert_eq!(result.result, TxResult::Success);

    let calls = interpreter.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].call_type, CallType::CREATE);
    assert_eq!(calls[0].result, TxResult::NoOp);
    assert_eq!(calls[0].address, None);
    assert_eq!(calls[0].gas_left, calls[0].gas_limit);
    assert_eq!(result.gas_used, 0);

    drop(vm);
    assert_eq!(db.get_nonce(factory).unwrap(), 0);
    assert_eq!(db.get_storage(factory, slot(1)).unwrap(), U256::from(1));
    assert!(
        !db.account_exists(calculate_create_address(factory, 0))
            .unwrap()
    );
}

// ==================== Cancellation ====================

#[test]
fn test_create_cancelled_during_init_code_is_reverted() {
    let token = CancellationToken::new();
    let init_code = Script::new()
        .sstore(1, 1)
        .op(Op::Cancel)
        .sstore(2, 2)
        .op(Op::Return(Bytes::from_static(b"\x01")))
        .build();
    let mut db = TestDatabase::new().with_balance(deployer(), 1_000).into_db();
    let mut vm = new_vm(
        &mut db,
        SPURIOUS_DRAGON_BLOCK,
        VMConfig::default(),
        Arc::new(ScriptedInterpreter::new().with_cancel_token(token.clone())),
    )
    .with_cancellation_token(token);

    let created = vm
        .create(deployer(), init_code, GAS, U256::from(30))
        .unwrap();
    let address = calculate_create_address(deployer(), 0);
    assert_eq!(
        created.context.result,
        TxResult::Revert(VMError::ExecutionFault(ExecutionFault::Cancelled))
    );
    assert_eq!(created.address, Some(address));
    assert_eq!(created.gas_left(), 0);
    assert_eq!(created.deposit_error, None);
    assert!(vm.is_cancelled());

    drop(vm);
    assert!(!db.account_exists(address).unwrap());
    assert_eq!(db.get_balance(deployer()).unwrap(), U256::from(1_000));
    assert_eq!(db.get_nonce(deployer()).unwrap(), 1);
}
