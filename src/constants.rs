pub mod accounts {

    pub const MIN_USERNAME_LEN: usize = 3;

    pub const MIN_PASSWORD_LEN: usize = 6;

    pub const MAX_PASSWORD_LEN: usize = 128;

    /// Attempts at finding a free `<name><4 digits>` username for Google sign-ups.
    pub const USERNAME_SUFFIX_ATTEMPTS: usize = 10;
}

pub mod ratings {

    pub const MIN: f64 = 0.0;

    pub const MAX: f64 = 5.0;
}

pub mod headers {

    pub const STRIPE_SIGNATURE: &str = "stripe-signature";
}

pub mod catalog {

    /// Labels stored in the genre set for home screen rows. Hidden from the
    /// genre listing.
    pub const NON_GENRE_TAGS: &[&str] = &[
        "upcoming",
        "now_playing",
        "trending",
        "top_rated",
        "movie",
        "series",
        "trailer",
    ];
}
