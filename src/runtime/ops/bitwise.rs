//! Bitwise, shift and bit-counting instructions
//!
//! Shift and rotate counts are taken modulo the operand width.

use super::{Stack, Trap, Value};

macro_rules! binop {
    ($name:ident, $pop:ident, $variant:ident, |$a:ident, $b:ident| $body:expr) => {
        pub fn $name(stack: &mut Stack) -> Result<(), Trap> {
            let $b = stack.$pop()?;
            let $a = stack.$pop()?;
            stack.push(Value::$variant($body));
            Ok(())
        }
    };
}

macro_rules! unop {
    ($name:ident, $pop:ident, $variant:ident, |$a:ident| $body:expr) => {
        pub fn $name(stack: &mut Stack) -> Result<(), Trap> {
            let $a = stack.$pop()?;
            stack.push(Value::$variant($body));
            Ok(())
        }
    };
}

binop!(i32_and, pop_i32, I32, |a, b| a & b);
binop!(i32_or, pop_i32, I32, |a, b| a | b);
binop!(i32_xor, pop_i32, I32, |a, b| a ^ b);
binop!(i32_shl, pop_i32, I32, |a, b| a.wrapping_shl(b as u32));
binop!(i32_shr_s, pop_i32, I32, |a, b| a.wrapping_shr(b as u32));
binop!(i32_shr_u, pop_i32, I32, |a, b| (a as u32).wrapping_shr(b as u32) as i32);
binop!(i32_rotl, pop_i32, I32, |a, b| a.rotate_left(b as u32 % 32));
binop!(i32_rotr, pop_i32, I32, |a, b| a.rotate_right(b as u32 % 32));

binop!(i64_and, pop_i64, I64, |a, b| a & b);
binop!(i64_or, pop_i64, I64, |a, b| a | b);
binop!(i64_xor, pop_i64, I64, |a, b| a ^ b);
binop!(i64_shl, pop_i64, I64, |a, b| a.wrapping_shl(b as u32));
binop!(i64_shr_s, pop_i64, I64, |a, b| a.wrapping_shr(b as u32));
binop!(i64_shr_u, pop_i64, I64, |a, b| (a as u64).wrapping_shr(b as u32) as i64);
binop!(i64_rotl, pop_i64, I64, |a, b| a.rotate_left((b as u64 % 64) as u32));
binop!(i64_rotr, pop_i64, I64, |a, b| a.rotate_right((b as u64 % 64) as u32));

unop!(i32_clz, pop_i32, I32, |a| a.leading_zeros() as i32);
unop!(i32_ctz, pop_i32, I32, |a| a.trailing_zeros() as i32);
unop!(i32_popcnt, pop_i32, I32, |a| a.count_ones() as i32);
unop!(i64_clz, pop_i64, I64, |a| a.leading_zeros() as i64);
unop!(i64_ctz, pop_i64, I64, |a| a.trailing_zeros() as i64);
unop!(i64_popcnt, pop_i64, I64, |a| a.count_ones() as i64);

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn run_i32(op: fn(&mut Stack) -> Result<(), Trap>, args: &[i32]) -> i32 {
        let mut stack = Stack::new();
        stack.push_all(args.iter().map(|v| Value::I32(*v)));
        op(&mut stack).unwrap();
        stack.pop_i32().unwrap()
    }

    #[rstest]
    #[case(i32_shl, &[1, 33], 2)]
    #[case(i32_shr_s, &[-8, 1], -4)]
    #[case(i32_shr_u, &[-8, 1], 0x7fff_fffc)]
    #[case(i32_rotl, &[0x8000_0001u32 as i32, 1], 3)]
    #[case(i32_rotr, &[1, 1], i32::MIN)]
    #[case(i32_clz, &[1], 31)]
    #[case(i32_clz, &[0], 32)]
    #[case(i32_ctz, &[0x100], 8)]
    #[case(i32_popcnt, &[-1], 32)]
    #[case(i32_xor, &[0b1100, 0b1010], 0b0110)]
    fn test_i32_bits(#[case] op: fn(&mut Stack) -> Result<(), Trap>, #[case] args: &[i32], #[case] expected: i32) {
        assert_eq!(run_i32(op, args), expected);
    }

    #[test]
    fn test_i64_shift_count_wraps() {
        let mut stack = Stack::new();
        stack.push(Value::I64(1));
        stack.push(Value::I64(65));
        i64_shl(&mut stack).unwrap();
        assert_eq!(stack.pop_i64().unwrap(), 2);

        stack.push(Value::I64(1));
        stack.push(Value::I64(-1));
        i64_rotl(&mut stack).unwrap();
        assert_eq!(stack.pop_i64().unwrap(), i64::MIN);
    }
}
