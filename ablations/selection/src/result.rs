//! 实验结果.

use crate::profile::Profile;
use cine_berry::stats::{CohortTable, Describe, TTest};
use std::io::{self, Write};

/// 将 `profile` 的结果写进 `w` 中.
fn describe_into<W: Write>(name: &str, p: &Profile, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    #[inline]
    fn f64_to_display(f: Option<f64>) -> String {
        match f {
            Some(f) => format!("{f:.6}"),
            None => "/".to_string(),
        }
    }

    writeln!(w, "Profile `{name}`:")?;
    writeln!(w, "{S4}Cases processed: {}", p.get_cases())?;
    writeln!(w, "{S4}Cases failed: {}", p.get_failed())?;
    writeln!(w, "{S4}Frames: {}", p.get_frames())?;
    writeln!(w, "{S4}Frames without selected component: {}", p.get_missed())?;
    writeln!(w, "{S4}Degenerate series: {}", p.get_degenerate())?;
    let d = Describe::of(p.get_ejection_fractions()).ok();
    writeln!(
        w,
        "{S4}Ejection fraction: mean {}, std {}",
        f64_to_display(d.map(|d| d.mean)),
        f64_to_display(d.map(|d| d.std))
    )?;
    write!(
        w,
        "{S4}Average time: {} us per frame",
        f64_to_display(p.get_avg_frame_time_us())
    )?;
    Ok(())
}

/// 消融实验最终结果.
pub struct AblationResult {
    data: Vec<(&'static str, Profile)>,
}

impl AblationResult {
    pub fn from_iter<I: IntoIterator<Item = (&'static str, Profile)>>(it: I) -> Self {
        Self {
            data: it.into_iter().collect(),
        }
    }

    /// 分析运行结果.
    pub fn analyze(&self) {
        utils::sep();
        let mut buf = Vec::with_capacity(512);

        for (key, profile) in self.data.iter() {
            describe_into(key, profile, &mut buf).unwrap();
            writeln!(&mut buf).unwrap();
            utils::sep_to(&mut buf);
            print!("{}", std::str::from_utf8(&buf).unwrap());
            buf.clear();
        }

        // 以第一个策略为基线, 比较射血分数分布.
        let table = CohortTable::from_groups(
            self.data
                .iter()
                .map(|(k, p)| (*k, p.get_ejection_fractions().to_vec())),
        );
        let Some((base, _)) = self.data.first() else {
            return;
        };
        for (key, _) in self.data.iter().skip(1) {
            match table.compare(base, key, &TTest::WELCH) {
                Ok(r) => println!(
                    "Welch t-test `{base}` vs `{key}`: t = {:.4}, p = {:.4}",
                    r.statistic, r.p_value
                ),
                Err(e) => println!("Welch t-test `{base}` vs `{key}`: {e}"),
            }
        }
        utils::sep();
    }
}
