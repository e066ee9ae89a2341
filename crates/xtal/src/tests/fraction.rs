use test_case::test_case;

use crate::{Vec3, fcoord, is_int, twelfths_of};

#[test_case(0.0, "0")]
#[test_case(1.0, "1/12")]
#[test_case(3.0, "1/4")]
#[test_case(6.0, "1/2")]
#[test_case(8.0, "2/3")]
#[test_case(12.0, "1")]
#[test_case(18.0, "3/2")]
#[test_case(16.0, "4/3")]
#[test_case(24.0, "2")]
#[test_case(-6.0, "-1/2")]
#[test_case(2.4, "1/5")]
fn twelfths(n: f64, want: &str) {
    assert_eq!(twelfths_of(n), want);
}

#[test_case(Vec3::zeros(), "0 0 0")]
#[test_case(Vec3::new(0.5, 0.0, 0.0), "1/2 0 0")]
#[test_case(Vec3::new(0.25, -0.25, 0.5), "1/4 -1/4 1/2")]
#[test_case(Vec3::new(1.0 / 3.0, 2.0 / 3.0, 0.0), "1/3 2/3 0")]
#[test_case(Vec3::new(1.0 / 12.0, 5.0 / 12.0, 1.0), "1/12 5/12 1")]
fn fcoords(q: Vec3, want: &str) {
    assert_eq!(fcoord(&q), want);
}

#[test]
fn ints() {
    assert!(is_int(0.0));
    assert!(is_int(2.0004));
    assert!(is_int(-0.9996));
    assert!(!is_int(0.5));
    assert!(!is_int(0.0011));
}
