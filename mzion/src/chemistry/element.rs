use std::{fmt::Display, marker::PhantomData, num::NonZeroU16};

use serde::{Deserialize, Serialize};

use crate::system::{Mass, da};

/// The mass of an electron
pub const ELECTRON_MASS: Mass = Mass {
    dimension: PhantomData,
    units: PhantomData,
    value: 5.485_799_090_65e-4,
};

/// All elements of the periodic table (and the electron to keep track of charge)
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[expect(missing_docs)]
pub enum Element {
    Electron,
    H,
    He,
    Li,
    Be,
    B,
    C,
    N,
    O,
    F,
    Ne,
    Na,
    Mg,
    Al,
    Si,
    P,
    S,
    Cl,
    Ar,
    K,
    Ca,
    Sc,
    Ti,
    V,
    Cr,
    Mn,
    Fe,
    Co,
    Ni,
    Cu,
    Zn,
    Ga,
    Ge,
    As,
    Se,
    Br,
    Kr,
    Rb,
    Sr,
    Y,
    Zr,
    Nb,
    Mo,
    Tc,
    Ru,
    Rh,
    Pd,
    Ag,
    Cd,
    In,
    Sn,
    Sb,
    Te,
    I,
    Xe,
    Cs,
    Ba,
    La,
    Ce,
    Pr,
    Nd,
    Pm,
    Sm,
    Eu,
    Gd,
    Tb,
    Dy,
    Ho,
    Er,
    Tm,
    Yb,
    Lu,
    Hf,
    Ta,
    W,
    Re,
    Os,
    Ir,
    Pt,
    Au,
    Hg,
    Tl,
    Pb,
    Bi,
    Po,
    At,
    Rn,
    Fr,
    Ra,
    Ac,
    Th,
    Pa,
    U,
    Np,
    Pu,
    Am,
    Cm,
    Bk,
    Cf,
    Es,
    Fm,
    Md,
    No,
    Lr,
    Rf,
    Db,
    Sg,
    Bh,
    Hs,
    Mt,
    Ds,
    Rg,
    Cn,
    Nh,
    Fl,
    Mc,
    Lv,
    Ts,
    Og,
}

/// All elements sorted so that the elements with the longest symbol come first, this is the
/// order in which they should be tried when parsing.
pub const ELEMENT_PARSE_LIST: &[(&str, Element)] = &[
    ("He", Element::He),
    ("Li", Element::Li),
    ("Be", Element::Be),
    ("Ne", Element::Ne),
    ("Na", Element::Na),
    ("Mg", Element::Mg),
    ("Al", Element::Al),
    ("Si", Element::Si),
    ("Cl", Element::Cl),
    ("Ar", Element::Ar),
    ("Ca", Element::Ca),
    ("Sc", Element::Sc),
    ("Ti", Element::Ti),
    ("Cr", Element::Cr),
    ("Mn", Element::Mn),
    ("Fe", Element::Fe),
    ("Co", Element::Co),
    ("Ni", Element::Ni),
    ("Cu", Element::Cu),
    ("Zn", Element::Zn),
    ("Ga", Element::Ga),
    ("Ge", Element::Ge),
    ("As", Element::As),
    ("Se", Element::Se),
    ("Br", Element::Br),
    ("Kr", Element::Kr),
    ("Rb", Element::Rb),
    ("Sr", Element::Sr),
    ("Zr", Element::Zr),
    ("Nb", Element::Nb),
    ("Mo", Element::Mo),
    ("Tc", Element::Tc),
    ("Ru", Element::Ru),
    ("Rh", Element::Rh),
    ("Pd", Element::Pd),
    ("Ag", Element::Ag),
    ("Cd", Element::Cd),
    ("In", Element::In),
    ("Sn", Element::Sn),
    ("Sb", Element::Sb),
    ("Te", Element::Te),
    ("Xe", Element::Xe),
    ("Cs", Element::Cs),
    ("Ba", Element::Ba),
    ("La", Element::La),
    ("Ce", Element::Ce),
    ("Pr", Element::Pr),
    ("Nd", Element::Nd),
    ("Pm", Element::Pm),
    ("Sm", Element::Sm),
    ("Eu", Element::Eu),
    ("Gd", Element::Gd),
    ("Tb", Element::Tb),
    ("Dy", Element::Dy),
    ("Ho", Element::Ho),
    ("Er", Element::Er),
    ("Tm", Element::Tm),
    ("Yb", Element::Yb),
    ("Lu", Element::Lu),
    ("Hf", Element::Hf),
    ("Ta", Element::Ta),
    ("Re", Element::Re),
    ("Os", Element::Os),
    ("Ir", Element::Ir),
    ("Pt", Element::Pt),
    ("Au", Element::Au),
    ("Hg", Element::Hg),
    ("Tl", Element::Tl),
    ("Pb", Element::Pb),
    ("Bi", Element::Bi),
    ("Po", Element::Po),
    ("At", Element::At),
    ("Rn", Element::Rn),
    ("Fr", Element::Fr),
    ("Ra", Element::Ra),
    ("Ac", Element::Ac),
    ("Th", Element::Th),
    ("Pa", Element::Pa),
    ("Np", Element::Np),
    ("Pu", Element::Pu),
    ("Am", Element::Am),
    ("Cm", Element::Cm),
    ("Bk", Element::Bk),
    ("Cf", Element::Cf),
    ("Es", Element::Es),
    ("Fm", Element::Fm),
    ("Md", Element::Md),
    ("No", Element::No),
    ("Lr", Element::Lr),
    ("Rf", Element::Rf),
    ("Db", Element::Db),
    ("Sg", Element::Sg),
    ("Bh", Element::Bh),
    ("Hs", Element::Hs),
    ("Mt", Element::Mt),
    ("Ds", Element::Ds),
    ("Rg", Element::Rg),
    ("Cn", Element::Cn),
    ("Nh", Element::Nh),
    ("Fl", Element::Fl),
    ("Mc", Element::Mc),
    ("Lv", Element::Lv),
    ("Ts", Element::Ts),
    ("Og", Element::Og),
    ("H", Element::H),
    ("B", Element::B),
    ("C", Element::C),
    ("N", Element::N),
    ("O", Element::O),
    ("F", Element::F),
    ("P", Element::P),
    ("S", Element::S),
    ("K", Element::K),
    ("V", Element::V),
    ("Y", Element::Y),
    ("I", Element::I),
    ("W", Element::W),
    ("U", Element::U),
    ("e", Element::Electron),
];

impl Element {
    /// The symbol of this element
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Electron => "e",
            Self::H => "H",
            Self::He => "He",
            Self::Li => "Li",
            Self::Be => "Be",
            Self::B => "B",
            Self::C => "C",
            Self::N => "N",
            Self::O => "O",
            Self::F => "F",
            Self::Ne => "Ne",
            Self::Na => "Na",
            Self::Mg => "Mg",
            Self::Al => "Al",
            Self::Si => "Si",
            Self::P => "P",
            Self::S => "S",
            Self::Cl => "Cl",
            Self::Ar => "Ar",
            Self::K => "K",
            Self::Ca => "Ca",
            Self::Sc => "Sc",
            Self::Ti => "Ti",
            Self::V => "V",
            Self::Cr => "Cr",
            Self::Mn => "Mn",
            Self::Fe => "Fe",
            Self::Co => "Co",
            Self::Ni => "Ni",
            Self::Cu => "Cu",
            Self::Zn => "Zn",
            Self::Ga => "Ga",
            Self::Ge => "Ge",
            Self::As => "As",
            Self::Se => "Se",
            Self::Br => "Br",
            Self::Kr => "Kr",
            Self::Rb => "Rb",
            Self::Sr => "Sr",
            Self::Y => "Y",
            Self::Zr => "Zr",
            Self::Nb => "Nb",
            Self::Mo => "Mo",
            Self::Tc => "Tc",
            Self::Ru => "Ru",
            Self::Rh => "Rh",
            Self::Pd => "Pd",
            Self::Ag => "Ag",
            Self::Cd => "Cd",
            Self::In => "In",
            Self::Sn => "Sn",
            Self::Sb => "Sb",
            Self::Te => "Te",
            Self::I => "I",
            Self::Xe => "Xe",
            Self::Cs => "Cs",
            Self::Ba => "Ba",
            Self::La => "La",
            Self::Ce => "Ce",
            Self::Pr => "Pr",
            Self::Nd => "Nd",
            Self::Pm => "Pm",
            Self::Sm => "Sm",
            Self::Eu => "Eu",
            Self::Gd => "Gd",
            Self::Tb => "Tb",
            Self::Dy => "Dy",
            Self::Ho => "Ho",
            Self::Er => "Er",
            Self::Tm => "Tm",
            Self::Yb => "Yb",
            Self::Lu => "Lu",
            Self::Hf => "Hf",
            Self::Ta => "Ta",
            Self::W => "W",
            Self::Re => "Re",
            Self::Os => "Os",
            Self::Ir => "Ir",
            Self::Pt => "Pt",
            Self::Au => "Au",
            Self::Hg => "Hg",
            Self::Tl => "Tl",
            Self::Pb => "Pb",
            Self::Bi => "Bi",
            Self::Po => "Po",
            Self::At => "At",
            Self::Rn => "Rn",
            Self::Fr => "Fr",
            Self::Ra => "Ra",
            Self::Ac => "Ac",
            Self::Th => "Th",
            Self::Pa => "Pa",
            Self::U => "U",
            Self::Np => "Np",
            Self::Pu => "Pu",
            Self::Am => "Am",
            Self::Cm => "Cm",
            Self::Bk => "Bk",
            Self::Cf => "Cf",
            Self::Es => "Es",
            Self::Fm => "Fm",
            Self::Md => "Md",
            Self::No => "No",
            Self::Lr => "Lr",
            Self::Rf => "Rf",
            Self::Db => "Db",
            Self::Sg => "Sg",
            Self::Bh => "Bh",
            Self::Hs => "Hs",
            Self::Mt => "Mt",
            Self::Ds => "Ds",
            Self::Rg => "Rg",
            Self::Cn => "Cn",
            Self::Nh => "Nh",
            Self::Fl => "Fl",
            Self::Mc => "Mc",
            Self::Lv => "Lv",
            Self::Ts => "Ts",
            Self::Og => "Og",
        }
    }

    /// Get all stable isotopes (N, mass in Da), the first isotope is the most abundant one.
    /// Elements without stable isotopes have no isotopes listed, so they have no defined mass.
    pub const fn isotopes(self) -> &'static [(u16, f64)] {
        match self {
            Self::H => &[(1, 1.007_825_032_23), (2, 2.014_101_778_12)],
            Self::He => &[(4, 4.002_603_254_13), (3, 3.016_029_320_1)],
            Self::Li => &[(7, 7.016_003_436_6), (6, 6.015_122_887_4)],
            Self::Be => &[(9, 9.012_183_065)],
            Self::B => &[(11, 11.009_305_36), (10, 10.012_936_95)],
            Self::C => &[(12, 12.0), (13, 13.003_354_835_07)],
            Self::N => &[(14, 14.003_074_004_43), (15, 15.000_108_898_88)],
            Self::O => &[
                (16, 15.994_914_619_57),
                (17, 16.999_131_756_50),
                (18, 17.999_159_612_86),
            ],
            Self::F => &[(19, 18.998_403_162_73)],
            Self::Ne => &[(20, 19.992_440_176_2), (22, 21.991_385_114), (21, 20.993_846_685)],
            Self::Na => &[(23, 22.989_769_282_0)],
            Self::Mg => &[(24, 23.985_041_697), (25, 24.985_836_976), (26, 25.982_592_968)],
            Self::Al => &[(27, 26.981_538_53)],
            Self::Si => &[(28, 27.976_926_534_65), (29, 28.976_494_664_9), (30, 29.973_770_136)],
            Self::P => &[(31, 30.973_761_998_42)],
            Self::S => &[(32, 31.972_071_174_4), (34, 33.967_867_004), (33, 32.971_458_909_8)],
            Self::Cl => &[(35, 34.968_852_682), (37, 36.965_902_602)],
            Self::Ar => &[(40, 39.962_383_123_7), (36, 35.967_545_105), (38, 37.962_732_11)],
            Self::K => &[(39, 38.963_706_486_4), (41, 40.961_825_257_9)],
            Self::Ca => &[(40, 39.962_590_863), (44, 43.955_481_56)],
            Self::Sc => &[(45, 44.955_908_28)],
            Self::Ti => &[
                (48, 47.947_941_98),
                (46, 45.952_627_72),
                (47, 46.951_758_79),
                (49, 48.947_865_68),
                (50, 49.944_786_89),
            ],
            Self::V => &[(51, 50.943_957_04), (50, 49.947_156_01)],
            Self::Cr => &[
                (52, 51.940_506_23),
                (53, 52.940_648_15),
                (50, 49.946_041_83),
                (54, 53.938_879_16),
            ],
            Self::Mn => &[(55, 54.938_043_91)],
            Self::Fe => &[
                (56, 55.934_936_33),
                (54, 53.939_608_99),
                (57, 56.935_392_84),
                (58, 57.933_274_43),
            ],
            Self::Co => &[(59, 58.933_194_29)],
            Self::Ni => &[(58, 57.935_342_41), (60, 59.930_785_88), (62, 61.928_345_37)],
            Self::Cu => &[(63, 62.929_597_72), (65, 64.927_789_70)],
            Self::Zn => &[(64, 63.929_142_01), (66, 65.926_033_81), (68, 67.924_844_55)],
            Self::Ga => &[(69, 68.925_573_5), (71, 70.924_702_58)],
            Self::Ge => &[
                (74, 73.921_177_761),
                (72, 71.922_075_826),
                (70, 69.924_248_75),
                (73, 72.923_458_956),
                (76, 75.921_402_726),
            ],
            Self::As => &[(75, 74.921_594_57)],
            Self::Se => &[(80, 79.916_521_8), (78, 77.917_309_1)],
            Self::Br => &[(79, 78.918_337_6), (81, 80.916_289_7)],
            Self::Kr => &[
                (84, 83.911_497_728_2),
                (86, 85.910_610_626_9),
                (82, 81.913_481_15),
                (83, 82.914_127),
            ],
            Self::Rb => &[(85, 84.911_789_737_9), (87, 86.909_180_531)],
            Self::Sr => &[
                (88, 87.905_612_5),
                (86, 85.909_260_6),
                (87, 86.908_877_5),
                (84, 83.913_419_1),
            ],
            Self::Y => &[(89, 88.905_840_3)],
            Self::Zr => &[
                (90, 89.904_697_7),
                (94, 93.906_310_8),
                (92, 91.905_034_7),
                (91, 90.905_639_6),
                (96, 95.908_271_4),
            ],
            Self::Nb => &[(93, 92.906_373)],
            Self::Mo => &[
                (98, 97.905_404_82),
                (96, 95.904_676_12),
                (95, 94.905_838_77),
                (92, 91.906_807_96),
                (100, 99.907_471_8),
                (97, 96.906_018_12),
                (94, 93.905_084_9),
            ],
            Self::Ru => &[
                (102, 101.904_344_1),
                (104, 103.905_427_5),
                (101, 100.905_576_9),
                (99, 98.905_934_1),
                (100, 99.904_214_3),
            ],
            Self::Rh => &[(103, 102.905_498)],
            Self::Pd => &[
                (106, 105.903_480_4),
                (108, 107.903_891_6),
                (105, 104.905_079_6),
                (110, 109.905_172_2),
                (104, 103.904_030_5),
            ],
            Self::Ag => &[(107, 106.905_091_6), (109, 108.904_755_3)],
            Self::Cd => &[
                (114, 113.903_365_09),
                (112, 111.902_762_87),
                (111, 110.904_182_87),
                (110, 109.903_006_61),
                (113, 112.904_408_13),
                (116, 115.904_763_15),
            ],
            Self::In => &[(115, 114.903_878_776), (113, 112.904_061_84)],
            Self::Sn => &[
                (120, 119.902_201_63),
                (118, 117.901_606_57),
                (116, 115.901_742_8),
                (119, 118.903_311_17),
                (117, 116.902_953_98),
            ],
            Self::Sb => &[(121, 120.903_812), (123, 122.904_213_2)],
            Self::Te => &[
                (130, 129.906_222_748),
                (128, 127.904_461_3),
                (126, 125.903_310_9),
                (125, 124.904_429_9),
            ],
            Self::I => &[(127, 126.904_471_9)],
            Self::Xe => &[
                (132, 131.904_155_086),
                (129, 128.904_780_861),
                (131, 130.905_084_06),
                (134, 133.905_394_66),
                (136, 135.907_214_484),
            ],
            Self::Cs => &[(133, 132.905_451_961)],
            Self::Ba => &[
                (138, 137.905_247),
                (137, 136.905_827_1),
                (136, 135.904_575_7),
                (135, 134.905_688_6),
            ],
            Self::La => &[(139, 138.906_356_3)],
            Self::Ce => &[(140, 139.905_443_1), (142, 141.909_250_4)],
            Self::Pr => &[(141, 140.907_657_6)],
            Self::Nd => &[
                (142, 141.907_729),
                (144, 143.910_093),
                (146, 145.913_122_6),
                (143, 142.909_82),
                (145, 144.912_579_3),
            ],
            Self::Sm => &[
                (152, 151.919_739_7),
                (154, 153.922_216_9),
                (147, 146.914_904_4),
                (149, 148.917_192_1),
                (148, 147.914_829_2),
            ],
            Self::Eu => &[(153, 152.921_238), (151, 150.919_857_8)],
            Self::Gd => &[
                (158, 157.924_112_3),
                (160, 159.927_062_4),
                (156, 155.922_131_2),
                (157, 156.923_968_6),
                (155, 154.922_630_5),
            ],
            Self::Tb => &[(159, 158.925_354_7)],
            Self::Dy => &[
                (164, 163.929_181_9),
                (162, 161.926_805_6),
                (163, 162.928_738_3),
                (161, 160.926_940_5),
            ],
            Self::Ho => &[(165, 164.930_328_8)],
            Self::Er => &[
                (166, 165.930_299_5),
                (168, 167.932_376_7),
                (167, 166.932_054_6),
                (170, 169.935_470_2),
            ],
            Self::Tm => &[(169, 168.934_217_9)],
            Self::Yb => &[
                (174, 173.938_866_4),
                (172, 171.936_385_9),
                (173, 172.938_215_1),
                (171, 170.936_330_2),
                (176, 175.942_576_4),
            ],
            Self::Lu => &[(175, 174.940_775_2), (176, 175.942_689_7)],
            Self::Hf => &[
                (180, 179.946_557),
                (178, 177.943_705_8),
                (177, 176.943_227_7),
                (179, 178.945_823_2),
            ],
            Self::Ta => &[(181, 180.947_995_8)],
            Self::W => &[
                (184, 183.950_930_92),
                (186, 185.954_362_8),
                (182, 181.948_203_94),
                (183, 182.950_222_75),
            ],
            Self::Re => &[(187, 186.955_750_1), (185, 184.952_954_5)],
            Self::Os => &[
                (192, 191.961_477),
                (190, 189.958_443_7),
                (189, 188.958_144_2),
                (188, 187.955_835_2),
            ],
            Self::Ir => &[(193, 192.962_921_6), (191, 190.960_589_3)],
            Self::Pt => &[
                (195, 194.964_791_7),
                (194, 193.962_680_9),
                (196, 195.964_952_09),
                (198, 197.967_894_9),
            ],
            Self::Au => &[(197, 196.966_568_79)],
            Self::Hg => &[
                (202, 201.970_643_4),
                (200, 199.968_326_59),
                (199, 198.968_280_64),
                (201, 200.970_302_84),
                (198, 197.966_768_6),
            ],
            Self::Tl => &[(205, 204.974_427_8), (203, 202.972_344_6)],
            Self::Pb => &[
                (208, 207.976_652_5),
                (206, 205.974_465_7),
                (207, 206.975_897_3),
                (204, 203.973_044),
            ],
            Self::Bi => &[(209, 208.980_399_1)],
            Self::Th => &[(232, 232.038_055_8)],
            Self::Pa => &[(231, 231.035_884_2)],
            Self::U => &[(238, 238.050_788_4), (235, 235.043_930_1), (234, 234.040_952_3)],
            Self::Electron
            | Self::Tc
            | Self::Pm
            | Self::Po
            | Self::At
            | Self::Rn
            | Self::Fr
            | Self::Ra
            | Self::Ac
            | Self::Np
            | Self::Pu
            | Self::Am
            | Self::Cm
            | Self::Bk
            | Self::Cf
            | Self::Es
            | Self::Fm
            | Self::Md
            | Self::No
            | Self::Lr
            | Self::Rf
            | Self::Db
            | Self::Sg
            | Self::Bh
            | Self::Hs
            | Self::Mt
            | Self::Ds
            | Self::Rg
            | Self::Cn
            | Self::Nh
            | Self::Fl
            | Self::Mc
            | Self::Lv
            | Self::Ts
            | Self::Og => &[],
        }
    }

    /// Validate this isotope to have a defined mass
    pub fn is_valid(self, isotope: Option<NonZeroU16>) -> bool {
        self.mass(isotope).is_some()
    }

    /// The monoisotopic mass of the specified isotope of this element (if that isotope exists),
    /// when no isotope is specified this is the mass of the most abundant isotope.
    pub fn mass(self, isotope: Option<NonZeroU16>) -> Option<Mass> {
        if self == Self::Electron {
            return isotope.is_none().then_some(ELECTRON_MASS);
        }
        isotope
            .map_or_else(
                || self.isotopes().first(),
                |isotope| self.isotopes().iter().find(|(n, _)| *n == isotope.get()),
            )
            .map(|(_, m)| da(*m))
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use std::num::NonZeroU16;

    use super::*;

    #[test]
    fn parse_list_order() {
        let mut seen_short = false;
        for (symbol, element) in ELEMENT_PARSE_LIST {
            assert_eq!(*symbol, element.symbol());
            if symbol.len() == 1 {
                seen_short = true;
            } else {
                assert!(!seen_short, "{symbol} is listed after a shorter symbol");
            }
        }
        // Every element (and the electron) can be parsed
        assert_eq!(ELEMENT_PARSE_LIST.len(), 119);
    }

    #[test]
    fn isotopes() {
        assert_eq!(Element::C.mass(None), Some(da(12.0)));
        assert_eq!(
            Element::C.mass(NonZeroU16::new(13)),
            Some(da(13.003_354_835_07))
        );
        assert_eq!(Element::C.mass(NonZeroU16::new(14)), None);
        assert!(Element::Electron.is_valid(None));
        assert!(!Element::Electron.is_valid(NonZeroU16::new(1)));
    }

    #[test]
    fn heavy_elements() {
        for (element, isotope, mass) in [
            (Element::Al, 27, 26.981_538_53),
            (Element::Sr, 88, 87.905_612_5),
            (Element::Ba, 138, 137.905_247),
            (Element::Pt, 195, 194.964_791_7),
            (Element::Au, 197, 196.966_568_79),
            (Element::Hg, 202, 201.970_643_4),
            (Element::U, 238, 238.050_788_4),
        ] {
            assert_eq!(element.isotopes()[0].0, isotope, "{element}");
            assert!((element.mass(None).unwrap().value - mass).abs() < 1e-6, "{element}");
        }
        // No stable isotopes so no defined mass
        assert_eq!(Element::Tc.mass(None), None);
        assert!(!Element::Og.is_valid(None));
        assert_eq!(Element::Og.symbol(), "Og");
    }
}
