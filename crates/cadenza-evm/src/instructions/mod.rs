//! Opcode handlers, grouped by concern.
//!
//! Handlers run after the step's gas has been charged. They pop their
//! operands, act, and tell the loop how to continue.

mod arithmetic;
mod bitwise;
mod block;
mod environment;
mod flow;
mod logging;
mod memory;
mod stack;
mod storage;
mod system;

use crate::opcode::Opcode;
use crate::table::Handler;

/// Handler for `opcode`
pub fn handler(opcode: Opcode) -> Handler {
    match opcode {
        Opcode::STOP => flow::stop,
        Opcode::ADD => arithmetic::add,
        Opcode::MUL => arithmetic::mul,
        Opcode::SUB => arithmetic::sub,
        Opcode::DIV => arithmetic::div,
        Opcode::SDIV => arithmetic::sdiv,
        Opcode::MOD => arithmetic::rem,
        Opcode::SMOD => arithmetic::smod,
        Opcode::ADDMOD => arithmetic::addmod,
        Opcode::MULMOD => arithmetic::mulmod,
        Opcode::EXP => arithmetic::exp,
        Opcode::SIGNEXTEND => arithmetic::signextend,

        Opcode::LT => bitwise::lt,
        Opcode::GT => bitwise::gt,
        Opcode::SLT => bitwise::slt,
        Opcode::SGT => bitwise::sgt,
        Opcode::EQ => bitwise::eq,
        Opcode::ISZERO => bitwise::iszero,
        Opcode::AND => bitwise::and,
        Opcode::OR => bitwise::or,
        Opcode::XOR => bitwise::xor,
        Opcode::NOT => bitwise::not,
        Opcode::BYTE => bitwise::byte,
        Opcode::SHL => bitwise::shl,
        Opcode::SHR => bitwise::shr,
        Opcode::SAR => bitwise::sar,

        Opcode::KECCAK256 => memory::keccak256,

        Opcode::ADDRESS => environment::address,
        Opcode::BALANCE => environment::balance,
        Opcode::ORIGIN => environment::origin,
        Opcode::CALLER => environment::caller,
        Opcode::CALLVALUE => environment::callvalue,
        Opcode::CALLDATALOAD => environment::calldataload,
        Opcode::CALLDATASIZE => environment::calldatasize,
        Opcode::CALLDATACOPY => environment::calldatacopy,
        Opcode::CODESIZE => environment::codesize,
        Opcode::CODECOPY => environment::codecopy,
        Opcode::GASPRICE => environment::gasprice,
        Opcode::EXTCODESIZE => environment::extcodesize,
        Opcode::EXTCODECOPY => environment::extcodecopy,
        Opcode::RETURNDATASIZE => environment::returndatasize,
        Opcode::RETURNDATACOPY => environment::returndatacopy,
        Opcode::EXTCODEHASH => environment::extcodehash,
        Opcode::SELFBALANCE => environment::selfbalance,

        Opcode::BLOCKHASH => block::blockhash,
        Opcode::COINBASE => block::coinbase,
        Opcode::TIMESTAMP => block::timestamp,
        Opcode::NUMBER => block::number,
        Opcode::PREVRANDAO => block::prevrandao,
        Opcode::GASLIMIT => block::gaslimit,
        Opcode::CHAINID => block::chainid,
        Opcode::BASEFEE => block::basefee,
        Opcode::BLOBHASH => block::blobhash,
        Opcode::BLOBBASEFEE => block::blobbasefee,

        Opcode::POP => stack::pop,
        Opcode::MLOAD => memory::mload,
        Opcode::MSTORE => memory::mstore,
        Opcode::MSTORE8 => memory::mstore8,
        Opcode::SLOAD => storage::sload,
        Opcode::SSTORE => storage::sstore,
        Opcode::JUMP => flow::jump,
        Opcode::JUMPI => flow::jumpi,
        Opcode::PC => flow::pc,
        Opcode::MSIZE => memory::msize,
        Opcode::GAS => flow::gas,
        Opcode::JUMPDEST => flow::jumpdest,
        Opcode::TLOAD => storage::tload,
        Opcode::TSTORE => storage::tstore,
        Opcode::MCOPY => memory::mcopy,
        Opcode::PUSH0 => stack::push0,

        op if op.is_push() => stack::push,
        op if op.dup_depth() > 0 => stack::dup,
        op if op.swap_depth() > 0 => stack::swap,

        Opcode::LOG0 | Opcode::LOG1 | Opcode::LOG2 | Opcode::LOG3 | Opcode::LOG4 => logging::log,

        Opcode::CREATE | Opcode::CREATE2 => system::create,
        Opcode::CALL | Opcode::CALLCODE | Opcode::DELEGATECALL | Opcode::STATICCALL => {
            system::call
        }
        Opcode::RETURN => flow::ret,
        Opcode::REVERT => flow::revert,
        Opcode::SELFDESTRUCT => system::selfdestruct,

        // INVALID and any opcode without its own handler
        _ => flow::invalid,
    }
}
