use pcomb_core::{parse, string, many, Arena, Sweeper, AllocError, Failure, Value};

use pcomb_shared_tests::{suites::{test_suite0, test_suite_sweep}, utils::get_arg_repeat};


#[test]
fn suite0_default_regions() {
    let mut arena = Arena::default();
    test_suite0(&mut arena);
    test_suite_sweep(&mut arena);
}

#[test]
fn suite0_small_regions() {
    // Small enough that the suite spills into many regions.
    let mut arena = Arena::new(128);
    test_suite0(&mut arena);
    assert!(arena.region_count() > 1);
    test_suite_sweep(&mut arena);
    assert_eq!(arena.region_count(), 1);
}

#[test]
fn suite0_through_dyn() {
    let mut arena = Arena::new(1024);
    test_suite0(arena.make_sweeper());
    let mut boxed: Box<dyn Sweeper> = Box::new(Arena::new(1024));
    test_suite0(&mut boxed);
    test_suite_sweep(&mut boxed);
}

#[test]
fn output_larger_than_region() {
    let mut arena = Arena::new(16);
    let p = string("0123456789abcdefg");
    assert_eq!(parse(&p, "0123456789abcdefg", &mut arena),
               Err(Failure::new(0, AllocError::TooLarge { requested: 17, capacity: 16 })));
}

#[test]
fn long_input() {
    let n = get_arg_repeat();
    let input = "ab".repeat(n);
    let mut arena = Arena::new(n * pcomb_core::Output::ENCODED_LEN);
    let s = parse(&many(string("ab")), &input, &mut arena).unwrap();
    assert_eq!(s.end, 2 * n);
    assert_eq!(s.output.array_len(), Some(n));
    assert_eq!(s.output.element(&arena, n - 1).unwrap().unwrap().to_value(&arena),
               Ok(Value::text("ab")));
    assert!(arena.region_count() > 1);
}
