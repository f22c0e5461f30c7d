/// Definitions loaded by [`Evaluator::with_prelude`](crate::Evaluator::with_prelude).
pub const PRELUDE: &str = r#"
# successor / predecessor
inc = ap add 1
dec = ap add -1

# 2^n by recursion through the definition table
pwr2 = ap ap s ap ap c ap eq 0 1 ap ap b ap mul 2 ap ap b pwr2 ap add -1

# ap ap checkerboard n 0: the points (x, y) of an n*n board with x + y even
checkerboard = ap ap s ap ap b s ap ap c ap ap b c ap ap b ap c ap c ap ap s ap ap b s ap ap b ap b ap ap s i i lt eq ap ap s mul i nil ap ap s ap ap b s ap ap b ap b cons ap ap s ap ap b s ap ap b ap b cons ap c div ap c ap ap s ap ap b b ap ap c ap ap b b add neg ap ap b ap s mul div ap ap c ap ap b b checkerboard ap ap c add 2
"#;
