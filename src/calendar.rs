//! Fixed Hijri calendar labels as they appear on the source portal.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HijriMonth {
    pub number: u32,
    pub name_ar: &'static str,
    pub name_en: &'static str,
}

/// Months in calendar order. Extraction scans them in this order.
pub static MONTHS: [HijriMonth; 12] = [
    HijriMonth {
        number: 1,
        name_ar: "محرم",
        name_en: "Muharram",
    },
    HijriMonth {
        number: 2,
        name_ar: "صفر",
        name_en: "Safar",
    },
    HijriMonth {
        number: 3,
        name_ar: "ربيع الأول",
        name_en: "Rabi al-Awwal",
    },
    HijriMonth {
        number: 4,
        name_ar: "ربيع الآخر",
        name_en: "Rabi al-Thani",
    },
    HijriMonth {
        number: 5,
        name_ar: "جمادى الأولى",
        name_en: "Jumada al-Ula",
    },
    HijriMonth {
        number: 6,
        name_ar: "جمادى الآخرة",
        name_en: "Jumada al-Thani",
    },
    HijriMonth {
        number: 7,
        name_ar: "رجب",
        name_en: "Rajab",
    },
    HijriMonth {
        number: 8,
        name_ar: "شعبان",
        name_en: "Shaban",
    },
    HijriMonth {
        number: 9,
        name_ar: "رمضان",
        name_en: "Ramadan",
    },
    HijriMonth {
        number: 10,
        name_ar: "شوال",
        name_en: "Shawwal",
    },
    HijriMonth {
        number: 11,
        name_ar: "ذو القعدة",
        name_en: "Dhul-Qadah",
    },
    HijriMonth {
        number: 12,
        name_ar: "ذو الحجة",
        name_en: "Dhul-Hijjah",
    },
];

/// Saturday through Friday.
pub static WEEKDAYS_AR: [&str; 7] = [
    "السبت",
    "الأحد",
    "الاثنين",
    "الثلاثاء",
    "الأربعاء",
    "الخميس",
    "الجمعة",
];

pub fn month_by_number(number: u32) -> Option<&'static HijriMonth> {
    MONTHS.iter().find(|month| month.number == number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn months_are_numbered_in_calendar_order() {
        for (index, month) in MONTHS.iter().enumerate() {
            assert_eq!(month.number as usize, index + 1);
        }
    }

    #[test]
    fn rajab_is_month_seven() {
        let rajab = month_by_number(7).expect("month 7 exists");
        assert_eq!(rajab.name_ar, "رجب");
        assert_eq!(rajab.name_en, "Rajab");
    }

    #[test]
    fn out_of_range_month_is_unknown() {
        assert!(month_by_number(0).is_none());
        assert!(month_by_number(13).is_none());
    }
}
