use super::types::RmdConfig;

pub const DEFAULT_RMD_START_AGE: u32 = 73;

// IRS Uniform Lifetime Table (2022 revision): age -> distribution period.
const UNIFORM_LIFETIME_TABLE: [(u32, f64); 49] = [
    (72, 27.4),
    (73, 26.5),
    (74, 25.5),
    (75, 24.6),
    (76, 23.7),
    (77, 22.9),
    (78, 22.0),
    (79, 21.1),
    (80, 20.2),
    (81, 19.4),
    (82, 18.5),
    (83, 17.7),
    (84, 16.8),
    (85, 16.0),
    (86, 15.2),
    (87, 14.4),
    (88, 13.7),
    (89, 12.9),
    (90, 12.2),
    (91, 11.5),
    (92, 10.8),
    (93, 10.1),
    (94, 9.5),
    (95, 8.9),
    (96, 8.4),
    (97, 7.8),
    (98, 7.3),
    (99, 6.8),
    (100, 6.4),
    (101, 6.0),
    (102, 5.6),
    (103, 5.2),
    (104, 4.9),
    (105, 4.6),
    (106, 4.3),
    (107, 4.1),
    (108, 3.9),
    (109, 3.7),
    (110, 3.5),
    (111, 3.4),
    (112, 3.3),
    (113, 3.1),
    (114, 3.0),
    (115, 2.9),
    (116, 2.8),
    (117, 2.7),
    (118, 2.5),
    (119, 2.3),
    (120, 2.0),
];

/// Distribution period for `age`, clamped to the first and last table rows.
pub fn distribution_period(age: u32) -> f64 {
    let (first_age, first_factor) = UNIFORM_LIFETIME_TABLE[0];
    if age <= first_age {
        return first_factor;
    }
    let (last_age, last_factor) = UNIFORM_LIFETIME_TABLE[UNIFORM_LIFETIME_TABLE.len() - 1];
    if age >= last_age {
        return last_factor;
    }
    UNIFORM_LIFETIME_TABLE[(age - first_age) as usize].1
}

pub fn calculate_rmd(prior_year_end_balance: f64, age: u32) -> f64 {
    calculate_rmd_from(prior_year_end_balance, age, DEFAULT_RMD_START_AGE)
}

pub fn calculate_rmd_from(prior_year_end_balance: f64, age: u32, start_age: u32) -> f64 {
    if age < start_age || prior_year_end_balance <= 0.0 {
        return 0.0;
    }
    prior_year_end_balance / distribution_period(age)
}

impl RmdConfig {
    pub fn required_for(&self, prior_year_end_balance: f64, age: u32) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        calculate_rmd_from(prior_year_end_balance, age, self.start_age)
    }
}
