use pcomb::{string, many, any_of, optional, choice, Arena, Sweeper, Failure, AllocError};
use pcomb::eval::parse;
use pcomb::sweeper::BoundedSweeper;

use pcomb_shared_tests::suites::{test_suite0, test_suite_sweep};


#[test]
fn suite0() {
    let mut bounded = BoundedSweeper::new(Arena::new(512), 1 << 20);
    test_suite0(&mut bounded);
    test_suite_sweep(&mut bounded);
    assert_eq!(bounded.used(), 0);
}

#[test]
fn untrusted_input_is_bounded() {
    let mut bounded = BoundedSweeper::new(Arena::default(), 100);
    let p = many(any_of("x"));
    // 4 elements of 21 bytes fit, 5 do not.
    assert!(parse(&p, "xxxx", &mut bounded).is_ok());
    bounded.sweep();
    assert_eq!(parse(&p, "xxxxx", &mut bounded),
               Err(Failure::new(0, AllocError::Exhausted { requested: 105, remaining: 100 })));
}

#[test]
fn exhaustion_is_not_recovered() {
    let mut bounded = BoundedSweeper::new(Arena::default(), 4);
    let p = choice([string("abcde"), optional(string("ab"))]);
    assert!(matches!(parse(&p, "abcde", &mut bounded),
                     Err(Failure { pos: 0, reason: pcomb::Reason::FailedAlloc(
                         AllocError::Exhausted { .. }) })));
}
