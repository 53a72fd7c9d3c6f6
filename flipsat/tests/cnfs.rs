use flipsat::solver::{SolveResult, Solver};

fn check_model(formula: &[i32], model: &[i32]) {
    for clause in formula.split(|&lit| lit == 0).filter(|clause| !clause.is_empty()) {
        assert!(
            clause
                .iter()
                .any(|&lit| model[lit.abs() as usize - 1] == lit),
            "clause {:?} is falsified",
            clause
        );
    }
}

macro_rules! test_cnf {
    ($name:ident, $result:expr) => {
        test_cnf!($name, $result, &[]);
    };
    ($name:ident, $result:expr, $options:expr) => {
        #[test]
        fn $name() {
            let _ = env_logger::builder().is_test(true).try_init();
            let cnf = include_bytes!(concat!("cnfs/", stringify!($name), ".cnf"));
            let formula = flipsat::dimacs::DimacsParser::parse(&cnf[..]).expect("parsing failed");

            let mut solver = Solver::new();
            solver.seed(7);
            solver.set_flips_limit(Some(10_000_000));
            let options: &[(&str, i32)] = $options;
            for &(name, value) in options {
                solver.set_option(name, value).expect("invalid option");
            }
            solver.add_dimacs_cnf(&cnf[..]).expect("loading failed");

            let result = $result;
            assert_eq!(solver.solve().expect("solve failed"), result);
            if result == SolveResult::Satisfiable {
                check_model(&formula, &solver.model().unwrap());
            } else {
                assert_eq!(solver.model(), None);
            }
        }
    };
}

test_cnf!(planted_3sat_100, SolveResult::Satisfiable);
test_cnf!(planted_5sat_50, SolveResult::Satisfiable, &[("pick", 1), ("correct", 1)]);

mod with_restarts {
    use super::*;

    test_cnf!(
        planted_3sat_100,
        SolveResult::Satisfiable,
        &[("restart", 100), ("restartouter", 1), ("restartouterfactor", 5)]
    );
}

mod unsat {
    use super::*;

    fn unknown_within(cnf: &[u8], prep: i32, flips: u64) -> Solver {
        let mut solver = Solver::new();
        solver.set_option("prep", prep).unwrap();
        solver.set_flips_limit(Some(flips));
        solver.add_dimacs_cnf(cnf).unwrap();
        assert_eq!(solver.solve().unwrap(), SolveResult::Unknown);
        assert_eq!(solver.model(), None);
        solver
    }

    #[test]
    fn php_4_3_unsat() {
        let cnf = include_bytes!("cnfs/php_4_3_unsat.cnf");
        let solver = unknown_within(&cnf[..], 1, 20_000);
        assert!(!solver.trivially_unsat());
        assert_eq!(solver.flips(), 20_000);
        assert_eq!(solver.minimum(), Some(1));
    }

    #[test]
    fn units_conflict_unsat() {
        let cnf = include_bytes!("cnfs/units_conflict_unsat.cnf");

        let solver = unknown_within(&cnf[..], 1, 1000);
        assert!(solver.trivially_unsat());
        assert_eq!(solver.flips(), 0);

        let solver = unknown_within(&cnf[..], 0, 1000);
        assert!(!solver.trivially_unsat());
        assert_eq!(solver.flips(), 1000);
    }
}
