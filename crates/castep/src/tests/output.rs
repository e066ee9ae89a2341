use approx::assert_abs_diff_eq;
use insta::assert_snapshot;
use xtal::{Mat3, Vec3};

use crate::{Config, read_file};

const SI: &str = "testfiles/si.castep";

#[test]
fn every_structure() {
    let asc = read_file(SI, Config::new()).unwrap();
    assert_eq!(asc.len(), 2);
    assert!(!asc.trajectory);

    let first = &asc.sets[0];
    assert_eq!(first.name.as_deref(), Some("Energy = -337.8623 eV"));
    assert_eq!(first.energy, Some(-337.8623));
    let labels: Vec<_> = first.atoms.iter().map(|a| a.label()).collect();
    assert_eq!(labels, vec!["Si1", "Si2"]);
    assert_eq!(first.atoms[0].partial_charge, Some(-0.012));
    assert_eq!(first.atoms[1].partial_charge, Some(0.012));
    assert_eq!(first.properties["spin"], vec![0.25, -0.25]);
    assert_abs_diff_eq!(
        first.atoms[1].coord,
        Vec3::new(1.34773225, 1.34773225, 1.34773225),
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(
        first.atoms[1].frac.unwrap(),
        Vec3::new(0.25, 0.25, 0.25)
    );
    assert_abs_diff_eq!(
        first.atoms[1].tensor.unwrap(),
        Mat3::from_diagonal_element(2.0)
    );
    assert_abs_diff_eq!(first.atoms[0].tensor.unwrap()[(2, 0)], 1.81939);

    let second = &asc.sets[1];
    assert_eq!(second.name.as_deref(), Some("Energy = -337.5 eV"));
    assert_eq!(second.atoms[0].partial_charge, Some(-0.02));
    assert_eq!(second.atoms[1].partial_charge, Some(0.02));
    assert!(second.properties.is_empty());
    assert!(second.atoms.iter().all(|a| a.tensor.is_none()));
    assert_abs_diff_eq!(second.atoms[1].coord.x, 1.323, epsilon = 1e-9);

    assert_eq!(
        asc.notes,
        vec![
            "Ellipsoids: Born Charge Tensors",
            "Ellipsoids set \"charge\": Born Effective Charges",
        ]
    );
}

#[test]
fn hirshfeld() {
    let config = Config::new().filter("charge=hirshfeld".parse().unwrap());
    let asc = read_file(SI, config).unwrap();
    let first = &asc.sets[0];
    assert_eq!(first.atoms[0].partial_charge, Some(0.05));
    assert_eq!(first.atoms[1].partial_charge, Some(-0.05));
    assert!(first.properties.is_empty());
    // the second structure only has a Mulliken table
    assert!(asc.sets[1].atoms.iter().all(|a| a.partial_charge.is_none()));
}

#[test]
fn first_model() {
    let asc = read_file(SI, Config::new().model(1)).unwrap();
    assert_eq!(asc.len(), 1);
    let set = &asc.sets[0];
    assert_eq!(set.energy, Some(-337.8623));
    assert_eq!(set.atoms[0].partial_charge, Some(-0.012));
    assert_eq!(asc.notes.len(), 2);
}

#[test]
fn second_model() {
    let asc = read_file(SI, Config::new().model(2)).unwrap();
    assert_eq!(asc.len(), 1);
    let set = &asc.sets[0];
    assert_eq!(set.energy, Some(-337.5));
    assert_eq!(set.atoms[1].partial_charge, Some(0.02));
    assert!(set.atoms.iter().all(|a| a.tensor.is_none()));
    assert!(asc.notes.is_empty());
}

#[test]
fn unreadable_energy() {
    let s = std::fs::read_to_string(SI)
        .unwrap()
        .replace("Final energy =  -337.5 ", "Final energy =  n/a ");
    let asc = crate::read_str(&s, Config::new()).unwrap();
    let second = &asc.sets[1];
    assert_eq!(second.energy, None);
    assert_eq!(second.name, None);
    assert_eq!(
        asc.notes.last().unwrap(),
        "CASTEP Energy could not be read: Final energy =  n/a     eV"
    );
}

#[test]
fn display() {
    let asc = read_file(SI, Config::new().model(2)).unwrap();
    assert_snapshot!(asc.to_string().trim(), @r"
    1 atom sets

    atom set 1: Energy = -337.5 eV
    a     2.700000     2.700000     0.000000
    b     2.700000     0.000000     2.700000
    c     0.000000     2.700000     2.700000
    energy = -337.5
    Si1      0.0000000000    0.0000000000    0.0000000000 q=-0.0200
    Si2      1.3230000000    1.3230000000    1.3500000000 q=0.0200
    ");
}
